pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod models;
pub mod shell;
