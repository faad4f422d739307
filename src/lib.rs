pub mod commands;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod options;
pub mod output;
pub mod registry;
pub mod types;
pub mod ui;
