use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleAction {
    Block,
    Unblock,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub dates: Vec<NaiveDate>,
    pub action: ScheduleAction,
}

/// A non-cancelled booking's interval, as rendered on the host calendar.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedInterval {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Raw schedule data; the caller unions blocked days and booked intervals
/// into a rendered calendar itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub blocked_dates: Vec<NaiveDate>,
    pub bookings: Vec<BookedInterval>,
}
