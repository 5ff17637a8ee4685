// nextboot - platform/mod.rs
//
// Platform abstraction layer: per-platform profiles, OS side effects,
// volume locking, and config directory handling.
// Must NOT depend on: app.

pub mod config;
pub mod lock;
pub mod profile;
pub mod system;
