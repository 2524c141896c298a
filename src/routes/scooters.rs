use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{Principal, Role};
use crate::error::{AppError, AppJson};
use crate::model::blocked_date::{
    BookedInterval, ScheduleAction, ScheduleResponse, UpdateScheduleRequest,
};
use crate::model::booking::{AvailabilityQuery, AvailabilityResponse, DateRange};
use crate::model::scooter::{CreateScooterRequest, Scooter, ScooterQuery, UpdateScooterRequest};
use crate::routes::bookings::conflicting_bookings;

pub fn scooter_router() -> Router {
    Router::new()
        .route("/api/scooters", get(list_scooters).post(create_scooter))
        .route(
            "/api/scooters/:id",
            get(get_scooter).put(update_scooter).delete(delete_scooter),
        )
        .route("/api/scooters/:id/availability", get(check_availability))
        .route(
            "/api/scooters/:id/blocked-dates",
            get(get_schedule).post(update_schedule),
        )
}

const SCOOTER_COLUMNS: &str = "id, name, scooter_type, price_per_day, rating, reviews, image, \
     description, specs, is_spotlight, manufacturer_url, location, owner_name, owner_whatsapp, \
     status, host_id, created_at";

// Publicly listed scooters either have no host or an approved one.
async fn list_scooters(
    Extension(pool): Extension<PgPool>,
    Query(params): Query<ScooterQuery>,
) -> Result<Json<Vec<Scooter>>, AppError> {
    let mut sql = format!(
        "SELECT {SCOOTER_COLUMNS} FROM scooters
         WHERE (host_id IS NULL
                OR EXISTS (SELECT 1 FROM hosts h
                           WHERE h.id = scooters.host_id
                             AND h.approval_status = 'approved'))"
    );
    if params.spotlight.unwrap_or(false) {
        sql.push_str(" AND is_spotlight = TRUE");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let scooters = sqlx::query_as::<_, Scooter>(&sql).fetch_all(&pool).await?;
    Ok(Json(scooters))
}

async fn get_scooter(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Scooter>, AppError> {
    let sql = format!("SELECT {SCOOTER_COLUMNS} FROM scooters WHERE id = $1");
    let scooter = sqlx::query_as::<_, Scooter>(&sql)
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Scooter"))?;
    Ok(Json(scooter))
}

async fn create_scooter(
    principal: Principal,
    Extension(pool): Extension<PgPool>,
    AppJson(payload): AppJson<CreateScooterRequest>,
) -> Result<(StatusCode, Json<Scooter>), AppError> {
    if !principal.can_manage_fleet() {
        return Err(AppError::Unauthorized);
    }
    if payload.name.trim().is_empty() || payload.scooter_type.trim().is_empty() {
        return Err(AppError::Validation(
            "Missing required fields: name, type".to_string(),
        ));
    }

    // A host's listings stay attached to their profile; superadmin-created
    // scooters are house inventory with no host.
    let host_id = match principal.role {
        Role::Host => principal.user_id,
        _ => None,
    };

    let sql = format!(
        "INSERT INTO scooters (id, name, scooter_type, price_per_day, rating, image, \
         description, specs, is_spotlight, manufacturer_url, location, owner_name, \
         owner_whatsapp, status, host_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
         RETURNING {SCOOTER_COLUMNS}"
    );
    let scooter = sqlx::query_as::<_, Scooter>(&sql)
        .bind(Uuid::new_v4())
        .bind(&payload.name)
        .bind(&payload.scooter_type)
        .bind(payload.price_per_day)
        .bind(payload.rating.unwrap_or(5.0))
        .bind(&payload.image)
        .bind(
            payload
                .description
                .as_deref()
                .unwrap_or("No description provided."),
        )
        .bind(payload.specs.clone().unwrap_or_else(|| serde_json::json!({})))
        .bind(payload.is_spotlight.unwrap_or(false))
        .bind(&payload.manufacturer_url)
        .bind(&payload.location)
        .bind(&payload.owner_name)
        .bind(&payload.owner_whatsapp)
        .bind(payload.status.as_deref().unwrap_or("Available"))
        .bind(host_id)
        .fetch_one(&pool)
        .await?;

    info!(scooter = %scooter.id, name = %scooter.name, "scooter created");
    Ok((StatusCode::CREATED, Json(scooter)))
}

async fn update_scooter(
    principal: Principal,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateScooterRequest>,
) -> Result<Json<Scooter>, AppError> {
    if !principal.can_manage_fleet() {
        return Err(AppError::Unauthorized);
    }

    // Partial update: only bind the fields the caller sent.
    let columns = [
        ("name", payload.name.is_some()),
        ("scooter_type", payload.scooter_type.is_some()),
        ("price_per_day", payload.price_per_day.is_some()),
        ("rating", payload.rating.is_some()),
        ("image", payload.image.is_some()),
        ("description", payload.description.is_some()),
        ("specs", payload.specs.is_some()),
        ("is_spotlight", payload.is_spotlight.is_some()),
        ("manufacturer_url", payload.manufacturer_url.is_some()),
        ("location", payload.location.is_some()),
        ("owner_name", payload.owner_name.is_some()),
        ("owner_whatsapp", payload.owner_whatsapp.is_some()),
        ("status", payload.status.is_some()),
    ];
    let mut set_parts = Vec::new();
    let mut param_count = 1;
    for (column, present) in columns {
        if present {
            set_parts.push(format!("{column} = ${param_count}"));
            param_count += 1;
        }
    }

    if set_parts.is_empty() {
        return Err(AppError::Validation("No valid fields to update".to_string()));
    }

    let sql = format!(
        "UPDATE scooters SET {} WHERE id = ${} RETURNING {SCOOTER_COLUMNS}",
        set_parts.join(", "),
        param_count
    );

    let mut query = sqlx::query_as::<_, Scooter>(&sql);
    if let Some(name) = &payload.name {
        query = query.bind(name);
    }
    if let Some(scooter_type) = &payload.scooter_type {
        query = query.bind(scooter_type);
    }
    if let Some(price_per_day) = payload.price_per_day {
        query = query.bind(price_per_day);
    }
    if let Some(rating) = payload.rating {
        query = query.bind(rating);
    }
    if let Some(image) = &payload.image {
        query = query.bind(image);
    }
    if let Some(description) = &payload.description {
        query = query.bind(description);
    }
    if let Some(specs) = &payload.specs {
        query = query.bind(specs);
    }
    if let Some(is_spotlight) = payload.is_spotlight {
        query = query.bind(is_spotlight);
    }
    if let Some(manufacturer_url) = &payload.manufacturer_url {
        query = query.bind(manufacturer_url);
    }
    if let Some(location) = &payload.location {
        query = query.bind(location);
    }
    if let Some(owner_name) = &payload.owner_name {
        query = query.bind(owner_name);
    }
    if let Some(owner_whatsapp) = &payload.owner_whatsapp {
        query = query.bind(owner_whatsapp);
    }
    if let Some(status) = &payload.status {
        query = query.bind(status);
    }
    query = query.bind(id);

    let scooter = query
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Scooter"))?;
    Ok(Json(scooter))
}

async fn delete_scooter(
    principal: Principal,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !principal.can_manage_fleet() {
        return Err(AppError::Unauthorized);
    }
    let result = sqlx::query("DELETE FROM scooters WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Scooter"));
    }
    info!(scooter = %id, "scooter deleted");
    Ok(Json(serde_json::json!({
        "message": "Scooter deleted successfully"
    })))
}

/// Read-only availability check. An unknown scooter simply has no
/// conflicts; dates are taken in caller order.
async fn check_availability(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let (start, end) = match (&params.start_date, &params.end_date) {
        (Some(start), Some(end)) => (parse_date(start)?, parse_date(end)?),
        _ => {
            return Err(AppError::Validation(
                "startDate and endDate are required".to_string(),
            ))
        }
    };

    let conflicts = conflicting_bookings(&pool, id, DateRange::new(start, end)).await?;
    Ok(Json(AvailabilityResponse {
        available: conflicts.is_empty(),
        conflicting_bookings: conflicts,
    }))
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    s.parse()
        .map_err(|_| AppError::Validation(format!("Invalid date: {s}")))
}

async fn get_schedule(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let blocked_dates: Vec<NaiveDate> =
        sqlx::query_scalar("SELECT date FROM blocked_dates WHERE scooter_id = $1 ORDER BY date")
            .bind(id)
            .fetch_all(&pool)
            .await?;

    let bookings = sqlx::query_as::<_, BookedInterval>(
        "SELECT start_date, end_date FROM bookings
         WHERE scooter_id = $1 AND status <> 'Cancelled'
         ORDER BY start_date",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    // The calendar UI unions blocked days with booked intervals itself.
    Ok(Json(ScheduleResponse {
        blocked_dates,
        bookings,
    }))
}

/// Block or unblock a batch of days. The whole batch is one transaction:
/// either every requested date changes state or none do. Re-blocking and
/// un-unblocking are no-ops, not errors.
async fn update_schedule(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateScheduleRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut tx = pool.begin().await?;

    match payload.action {
        ScheduleAction::Block => {
            for date in &payload.dates {
                sqlx::query(
                    "INSERT INTO blocked_dates (scooter_id, date) VALUES ($1, $2)
                     ON CONFLICT (scooter_id, date) DO NOTHING",
                )
                .bind(id)
                .bind(date)
                .execute(&mut tx)
                .await?;
            }
        }
        ScheduleAction::Unblock => {
            sqlx::query("DELETE FROM blocked_dates WHERE scooter_id = $1 AND date = ANY($2)")
                .bind(id)
                .bind(&payload.dates)
                .execute(&mut tx)
                .await?;
        }
    }

    tx.commit().await?;
    info!(scooter = %id, dates = payload.dates.len(), "schedule updated");
    Ok(Json(serde_json::json!({
        "message": "Schedule updated successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a live Postgres; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn blocking_a_day_twice_leaves_one_row_and_stray_unblock_is_a_noop() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!().run(&pool).await.expect("migrate");

        let scooter_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO scooters (id, name, scooter_type, price_per_day)
             VALUES ($1, 'Calendar Test', 'Scooter', 25)",
        )
        .bind(scooter_id)
        .execute(&pool)
        .await
        .expect("seed scooter");

        let day: NaiveDate = "2025-07-01".parse().unwrap();
        for _ in 0..2 {
            sqlx::query(
                "INSERT INTO blocked_dates (scooter_id, date) VALUES ($1, $2)
                 ON CONFLICT (scooter_id, date) DO NOTHING",
            )
            .bind(scooter_id)
            .bind(day)
            .execute(&pool)
            .await
            .expect("block");
        }
        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blocked_dates WHERE scooter_id = $1 AND date = $2",
        )
        .bind(scooter_id)
        .bind(day)
        .fetch_one(&pool)
        .await
        .expect("count");
        assert_eq!(rows, 1);

        let never_blocked: NaiveDate = "2025-07-02".parse().unwrap();
        let deleted = sqlx::query(
            "DELETE FROM blocked_dates WHERE scooter_id = $1 AND date = ANY($2)",
        )
        .bind(scooter_id)
        .bind(vec![never_blocked])
        .execute(&pool)
        .await
        .expect("unblock");
        assert_eq!(deleted.rows_affected(), 0);

        sqlx::query("DELETE FROM scooters WHERE id = $1")
            .bind(scooter_id)
            .execute(&pool)
            .await
            .expect("cleanup");
    }
}
