// nextboot - lib.rs
//
// Library entry point, exposing all modules for integration testing and
// for callers that want to drive a switch programmatically.
//
// The binary in `main.rs` only parses arguments, sets up logging, and prints
// progress.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
