pub mod display;
pub mod reports;
pub mod sale;
