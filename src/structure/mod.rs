pub mod analytics;
pub mod complaints;
pub mod users;
