pub mod blocked_date;
pub mod booking;
pub mod host;
pub mod scooter;
