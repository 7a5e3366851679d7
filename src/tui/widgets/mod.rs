pub mod dashboard;
pub mod listing;
pub mod quiz;
