pub mod api;
pub mod commentary;
pub mod config;
pub mod core;
