pub mod add;
pub mod export;
pub mod setup;
pub mod summary;
pub mod ui;
