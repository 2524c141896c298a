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
use crate::model::booking::{
    Booking, BookingStatus, BookingSummary, CreateBookingRequest, DateRange, UpdateStatusRequest,
};
use crate::notify::Notifier;
use crate::shortid::{self, AllocError, Attempt};

pub fn booking_router() -> Router {
    Router::new()
        .route("/api/bookings", post(create_booking).get(list_bookings))
        .route("/api/bookings/:id", get(get_booking))
        .route("/api/bookings/:id/status", patch(update_booking_status))
        .route("/api/bookings/:id/cancel", patch(cancel_booking))
}

/// Non-terminal bookings on the scooter whose closed date interval shares
/// at least one day with the requested one. The SQL narrows to candidate
/// rows; [`DateRange::overlaps`] is the normative predicate.
pub async fn conflicting_bookings(
    pool: &PgPool,
    scooter_id: Uuid,
    range: DateRange,
) -> Result<Vec<BookingSummary>, sqlx::Error> {
    let sql = format!(
        "SELECT id, start_date, end_date, rider_name, status
         FROM bookings
         WHERE scooter_id = $1
           AND status IN ({})
           AND start_date <= $3 AND end_date >= $2
         ORDER BY start_date",
        BookingStatus::blocking_set_sql()
    );
    let candidates = sqlx::query_as::<_, BookingSummary>(&sql)
        .bind(scooter_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(pool)
        .await?;

    Ok(candidates
        .into_iter()
        .filter(|b| range.overlaps(&DateRange::new(b.start_date, b.end_date)))
        .collect())
}

async fn scooter_name(pool: &PgPool, scooter_id: Uuid) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM scooters WHERE id = $1")
        .bind(scooter_id)
        .fetch_optional(pool)
        .await
}

async fn create_booking(
    principal: Principal,
    Extension(pool): Extension<PgPool>,
    Extension(notifier): Extension<Notifier>,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    payload.validate()?;

    let scooter = scooter_name(&pool, payload.scooter_id)
        .await?
        .ok_or(AppError::NotFound("Scooter"))?;

    // Pre-check so the caller gets the conflicting intervals back. The
    // exclusion constraint below remains the authoritative guard; this
    // read alone cannot rule out a concurrent insert.
    let conflicts = conflicting_bookings(&pool, payload.scooter_id, payload.range()).await?;
    if !conflicts.is_empty() {
        return Err(AppError::BookingConflict(conflicts));
    }

    let user_id = payload.user_id.or(principal.user_id);
    let documents = payload
        .documents
        .clone()
        .unwrap_or_else(|| serde_json::json!({}));

    let payload = &payload;
    let documents = &documents;
    let pool_ref = &pool;
    let inserted = shortid::insert_with_code_retry(move |code| async move {
        let result = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, scooter_id, user_id, rider_name, rider_email, \
             rider_phone, rider_passport, start_date, end_date, total_amount, documents, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'Pending')
             RETURNING id, scooter_id, user_id, rider_name, rider_email, rider_phone, \
             rider_passport, start_date, end_date, total_amount, documents, status, \
             verification_status, created_at",
        )
        .bind(code)
        .bind(payload.scooter_id)
        .bind(user_id)
        .bind(&payload.rider_name)
        .bind(&payload.rider_email)
        .bind(&payload.rider_phone)
        .bind(&payload.rider_passport)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.total_amount)
        .bind(documents)
        .fetch_one(pool_ref)
        .await;
        match result {
            Ok(booking) => Attempt::Inserted(booking),
            Err(err) if violated_constraint(&err) == Some("bookings_pkey") => {
                Attempt::DuplicateCode
            }
            Err(err) => Attempt::Failed(err),
        }
    })
    .await;

    let booking = match inserted {
        Ok(booking) => booking,
        Err(AllocError::Exhausted) => return Err(AppError::IdSpaceExhausted),
        Err(AllocError::Other(err))
            if violated_constraint(&err) == Some("bookings_no_overlap") =>
        {
            // A concurrent request won the race between our pre-check and
            // the insert; report it exactly like a pre-checked conflict.
            let conflicts =
                conflicting_bookings(&pool, payload.scooter_id, payload.range()).await?;
            return Err(AppError::BookingConflict(conflicts));
        }
        Err(AllocError::Other(err)) => return Err(err.into()),
    };

    info!(booking = %booking.id, scooter = %booking.scooter_id, "booking created");
    notifier.booking_created(&booking, &scooter);

    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(
    principal: Principal,
    Extension(pool): Extension<PgPool>,
) -> Result<Json<Vec<Booking>>, AppError> {
    // Anonymous access only happens behind the local admin proxy, which
    // strips identity headers; it sees everything, like a superadmin.
    let sees_all =
        principal.is_admin() || (principal.user_id.is_none() && principal.email.is_none());

    let bookings = if sees_all {
        sqlx::query_as::<_, Booking>(
            "SELECT id, scooter_id, user_id, rider_name, rider_email, rider_phone, \
             rider_passport, start_date, end_date, total_amount, documents, status, \
             verification_status, created_at
             FROM bookings ORDER BY created_at DESC LIMIT 100",
        )
        .fetch_all(&pool)
        .await?
    } else {
        sqlx::query_as::<_, Booking>(
            "SELECT id, scooter_id, user_id, rider_name, rider_email, rider_phone, \
             rider_passport, start_date, end_date, total_amount, documents, status, \
             verification_status, created_at
             FROM bookings
             WHERE user_id = $1 OR rider_email = $2
             ORDER BY created_at DESC LIMIT 100",
        )
        .bind(principal.user_id)
        .bind(principal.email)
        .fetch_all(&pool)
        .await?
    };

    Ok(Json(bookings))
}

async fn fetch_booking(pool: &PgPool, id: &str) -> Result<Booking, AppError> {
    sqlx::query_as::<_, Booking>(
        "SELECT id, scooter_id, user_id, rider_name, rider_email, rider_phone, \
         rider_passport, start_date, end_date, total_amount, documents, status, \
         verification_status, created_at
         FROM bookings WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Booking"))
}

async fn get_booking(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(fetch_booking(&pool, &id).await?))
}

async fn update_booking_status(
    Extension(pool): Extension<PgPool>,
    Extension(notifier): Extension<Notifier>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let status = BookingStatus::parse(&payload.status)
        .ok_or_else(|| AppError::Validation(format!("Unknown status: {}", payload.status)))?;

    // Moving to Active doubles as customer verification.
    let sql = if status == BookingStatus::Active {
        "UPDATE bookings SET status = $1, verification_status = 'Verified'
         WHERE id = $2
         RETURNING id, scooter_id, user_id, rider_name, rider_email, rider_phone, \
         rider_passport, start_date, end_date, total_amount, documents, status, \
         verification_status, created_at"
    } else {
        "UPDATE bookings SET status = $1
         WHERE id = $2
         RETURNING id, scooter_id, user_id, rider_name, rider_email, rider_phone, \
         rider_passport, start_date, end_date, total_amount, documents, status, \
         verification_status, created_at"
    };

    let updated = sqlx::query_as::<_, Booking>(sql)
        .bind(status.as_str())
        .bind(&id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Booking"))?;

    info!(booking = %updated.id, status = status.as_str(), "booking status updated");

    if status == BookingStatus::Active {
        if let Some(name) = scooter_name(&pool, updated.scooter_id).await? {
            notifier.booking_approved(&updated, &name);
        }
    }

    Ok(Json(updated))
}

async fn cancel_booking(
    principal: Principal,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = fetch_booking(&pool, &id).await?;

    if !principal.is_admin()
        && !principal.owns_booking(booking.user_id, booking.rider_email.as_deref())
    {
        return Err(AppError::Unauthorized);
    }

    if let Some(status) = BookingStatus::parse(&booking.status) {
        if status.is_terminal() {
            let message = if status == BookingStatus::Cancelled {
                "Booking is already cancelled"
            } else {
                "Cannot cancel a completed booking"
            };
            return Err(AppError::Validation(message.to_string()));
        }
    }

    let cancelled = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET status = 'Cancelled', verification_status = 'Rejected'
         WHERE id = $1
         RETURNING id, scooter_id, user_id, rider_name, rider_email, rider_phone, \
         rider_passport, start_date, end_date, total_amount, documents, status, \
         verification_status, created_at",
    )
    .bind(&id)
    .fetch_one(&pool)
    .await?;

    info!(booking = %cancelled.id, "booking cancelled");
    Ok(Json(cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    // A lazy pool never connects; every request here is rejected before
    // any query runs.
    fn app() -> Router {
        let pool = PgPool::connect_lazy("postgres://postgres@localhost:1/unreachable")
            .expect("lazy pool");
        booking_router()
            .layer(Extension(pool))
            .layer(Extension(Notifier::new(None)))
    }

    async fn post_booking(body: String) -> StatusCode {
        let request = Request::builder()
            .method("POST")
            .uri("/api/bookings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn omitted_required_field_is_rejected_with_400() {
        let body = serde_json::json!({
            "scooterId": Uuid::new_v4(),
            "riderName": "Asha Perera",
            "riderPassport": "N1234567",
            "startDate": "2025-06-10",
            "endDate": "2025-06-15",
            "totalAmount": 125.0
        });
        // riderPhone is absent entirely, not just blank.
        assert_eq!(post_booking(body.to_string()).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_required_field_is_rejected_with_400() {
        let body = serde_json::json!({
            "scooterId": Uuid::new_v4(),
            "riderName": "Asha Perera",
            "riderPhone": "   ",
            "riderPassport": "N1234567",
            "startDate": "2025-06-10",
            "endDate": "2025-06-15",
            "totalAmount": 125.0
        });
        assert_eq!(post_booking(body.to_string()).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_body_is_rejected_with_400() {
        assert_eq!(
            post_booking("{not json".to_string()).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn status_update_without_a_status_is_rejected_with_400() {
        let request = Request::builder()
            .method("PATCH")
            .uri("/api/bookings/ABCDE/status")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let status = app().oneshot(request).await.unwrap().status();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
