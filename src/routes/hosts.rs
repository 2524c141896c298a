use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{violated_constraint, AppError, AppJson};
use crate::model::host::{HostProfile, RegisterHostRequest, UpdateHostStatusRequest};

pub fn host_router() -> Router {
    Router::new()
        .route("/api/hosts/register", post(register_host))
        .route("/api/admin/hosts", get(list_hosts))
        .route("/api/admin/hosts/:id", patch(update_host_status))
}

const HOST_COLUMNS: &str = "id, email, name, phone_number, institution_name, \
     institution_address, nic_number, nic_photo, approval_status, created_at";

/// New hosts land in `pending` and stay invisible to the public catalog
/// until a superadmin approves them.
async fn register_host(
    Extension(pool): Extension<PgPool>,
    AppJson(payload): AppJson<RegisterHostRequest>,
) -> Result<(StatusCode, Json<HostProfile>), AppError> {
    payload.validate()?;

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM hosts WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await?;
    if existing.is_some() {
        return Err(duplicate_email());
    }

    let sql = format!(
        "INSERT INTO hosts (id, email, name, phone_number, institution_name, \
         institution_address, nic_number, nic_photo, approval_status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
         RETURNING {HOST_COLUMNS}"
    );
    let inserted = sqlx::query_as::<_, HostProfile>(&sql)
        .bind(Uuid::new_v4())
        .bind(&payload.email)
        .bind(&payload.name)
        .bind(&payload.phone_number)
        .bind(&payload.institution_name)
        .bind(&payload.institution_address)
        .bind(&payload.nic_number)
        .bind(&payload.nic_photo)
        .fetch_one(&pool)
        .await;
    let host = match inserted {
        Ok(host) => host,
        // A concurrent registration can slip between the read above and
        // this insert; the unique index is the authoritative check.
        Err(err) if violated_constraint(&err) == Some("hosts_email_key") => {
            return Err(duplicate_email())
        }
        Err(err) => return Err(err.into()),
    };

    info!(host = %host.id, email = %host.email, "host registered, pending approval");
    Ok((StatusCode::CREATED, Json(host)))
}

fn duplicate_email() -> AppError {
    AppError::Validation("A host already exists with this email".to_string())
}

async fn list_hosts(
    principal: Principal,
    Extension(pool): Extension<PgPool>,
) -> Result<Json<Vec<HostProfile>>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Unauthorized);
    }
    let sql = format!("SELECT {HOST_COLUMNS} FROM hosts ORDER BY created_at DESC");
    let hosts = sqlx::query_as::<_, HostProfile>(&sql)
        .fetch_all(&pool)
        .await?;
    Ok(Json(hosts))
}

async fn update_host_status(
    principal: Principal,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateHostStatusRequest>,
) -> Result<Json<HostProfile>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Unauthorized);
    }
    let status = payload.validated_status()?;

    let sql = format!(
        "UPDATE hosts SET approval_status = $1 WHERE id = $2 RETURNING {HOST_COLUMNS}"
    );
    let host = sqlx::query_as::<_, HostProfile>(&sql)
        .bind(status)
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Host"))?;

    info!(host = %host.id, status = %host.approval_status, "host approval updated");
    Ok(Json(host))
}
