use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// A booking occupies a closed calendar interval: both endpoints are
/// rental days. Two bookings sharing a boundary day conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The documented conflict predicate: the requested range (`self`)
    /// overlaps an existing range if its start falls inside the existing
    /// one, its end falls inside the existing one, or it fully contains
    /// the existing one.
    pub fn overlaps(&self, existing: &DateRange) -> bool {
        (existing.start <= self.start && self.start <= existing.end)
            || (existing.start <= self.end && self.end <= existing.end)
            || (self.start <= existing.start && existing.end <= self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Active => "Active",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(BookingStatus::Pending),
            "Active" => Some(BookingStatus::Active),
            "Completed" => Some(BookingStatus::Completed),
            "Cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Active,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    /// Only non-terminal bookings occupy their dates.
    pub fn is_blocking(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// The blocking statuses as a quoted SQL literal list, so the conflict
    /// queries filter on the same set [`is_blocking`] defines.
    pub fn blocking_set_sql() -> String {
        Self::ALL
            .iter()
            .filter(|s| s.is_blocking())
            .map(|s| format!("'{}'", s.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub scooter_id: Uuid,
    pub user_id: Option<Uuid>,
    pub rider_name: String,
    pub rider_email: Option<String>,
    pub rider_phone: String,
    pub rider_passport: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: f64,
    pub documents: serde_json::Value,
    pub status: String,
    pub verification_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What callers get back when their dates clash: just enough for a
/// calendar UI, never the full row.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rider_name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub scooter_id: Uuid,
    pub user_id: Option<Uuid>,
    pub rider_name: String,
    pub rider_email: Option<String>,
    pub rider_phone: String,
    pub rider_passport: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: f64,
    pub documents: Option<serde_json::Value>,
}

impl CreateBookingRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if self.rider_name.trim().is_empty() {
            missing.push("riderName");
        }
        if self.rider_phone.trim().is_empty() {
            missing.push("riderPhone");
        }
        if self.rider_passport.trim().is_empty() {
            missing.push("riderPassport");
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        if self.start_date > self.end_date {
            return Err(AppError::Validation(
                "startDate must not be after endDate".to_string(),
            ));
        }
        Ok(())
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
    pub conflicting_bookings: Vec<BookingSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(d(start), d(end))
    }

    #[test]
    fn all_four_overlap_shapes_conflict() {
        let existing = range("2025-06-10", "2025-06-15");
        // requested starts inside the existing booking
        assert!(range("2025-06-12", "2025-06-20").overlaps(&existing));
        // requested ends inside the existing booking
        assert!(range("2025-06-05", "2025-06-11").overlaps(&existing));
        // requested contains the existing booking
        assert!(range("2025-06-01", "2025-06-30").overlaps(&existing));
        // existing contains the requested booking
        assert!(range("2025-06-12", "2025-06-13").overlaps(&existing));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = range("2025-06-10", "2025-06-15");
        let b = range("2025-06-14", "2025-06-20");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn shared_boundary_day_is_a_conflict() {
        let existing = range("2025-06-10", "2025-06-15");
        assert!(range("2025-06-15", "2025-06-20").overlaps(&existing));
        assert!(range("2025-06-05", "2025-06-10").overlaps(&existing));
        // single-day booking exactly on an endpoint
        assert!(range("2025-06-10", "2025-06-10").overlaps(&existing));
    }

    #[test]
    fn adjacent_days_do_not_conflict() {
        let existing = range("2025-06-10", "2025-06-15");
        assert!(!range("2025-06-16", "2025-06-20").overlaps(&existing));
        assert!(!range("2025-06-01", "2025-06-09").overlaps(&existing));
    }

    #[test]
    fn strictly_disjoint_ranges_do_not_conflict() {
        let a = range("2025-01-01", "2025-01-03");
        let b = range("2025-01-05", "2025-01-08");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn single_day_ranges() {
        let a = range("2025-06-10", "2025-06-10");
        assert!(a.overlaps(&range("2025-06-10", "2025-06-10")));
        assert!(!a.overlaps(&range("2025-06-11", "2025-06-11")));
    }

    #[test]
    fn only_pending_and_active_block() {
        assert!(BookingStatus::Pending.is_blocking());
        assert!(BookingStatus::Active.is_blocking());
        assert!(!BookingStatus::Completed.is_blocking());
        assert!(!BookingStatus::Cancelled.is_blocking());
    }

    #[test]
    fn terminal_states() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Active.is_terminal());
    }

    #[test]
    fn blocking_set_sql_lists_exactly_the_blocking_statuses() {
        assert_eq!(BookingStatus::blocking_set_sql(), "'Pending', 'Active'");
    }

    #[test]
    fn status_round_trips_through_text() {
        for s in BookingStatus::ALL {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(BookingStatus::parse("pending"), None);
        assert_eq!(BookingStatus::parse("Refunded"), None);
    }

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            scooter_id: Uuid::new_v4(),
            user_id: None,
            rider_name: "Asha Perera".to_string(),
            rider_email: Some("asha@example.com".to_string()),
            rider_phone: "+94770000000".to_string(),
            rider_passport: "N1234567".to_string(),
            start_date: d("2025-06-10"),
            end_date: d("2025-06-15"),
            total_amount: 125.0,
            documents: None,
        }
    }

    #[test]
    fn complete_request_validates() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let mut req = request();
        req.rider_phone = "  ".to_string();
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("riderPhone")));
    }

    #[test]
    fn several_missing_fields_are_all_reported() {
        let mut req = request();
        req.rider_name = String::new();
        req.rider_passport = String::new();
        let err = req.validate().unwrap_err();
        match err {
            AppError::Validation(m) => {
                assert!(m.contains("riderName"));
                assert!(m.contains("riderPassport"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let mut req = request();
        req.start_date = d("2025-06-20");
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }
}
