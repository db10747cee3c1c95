#![cfg(feature = "integration")]

mod common;

#[path = "integration/chrome_session.rs"]
mod chrome_session;
#[path = "integration/completions.rs"]
mod completions;
#[path = "integration/start_stop.rs"]
mod start_stop;
