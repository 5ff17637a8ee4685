// nextboot - app/mod.rs
//
// Application layer: orchestrates core and platform for one invocation.

pub mod dispatch;
