pub mod bookings;
pub mod hosts;
pub mod scooters;
