pub mod browser;
pub mod time;
