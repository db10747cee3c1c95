pub mod browser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod docker;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod outcome;
pub mod platform;
pub mod status;
pub mod tui;
pub mod ui;

pub use error::{Error, Result};
