pub mod convert;
pub mod providers;
pub mod setup;
pub mod ui;
