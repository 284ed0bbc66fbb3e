pub mod users;
pub mod uploads;
pub mod metrics;
