// nextboot - core/mod.rs
//
// Core logic: finding the bootloader configuration and rewriting its
// default-selection directive.
// Must NOT depend on: platform or app.

pub mod directive;
pub mod locator;
pub mod model;
pub mod selector;
