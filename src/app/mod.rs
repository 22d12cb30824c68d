// varwatch - app/mod.rs
//
// Application layer: configuration, workspace discovery, and the polling
// monitor. Owns all filesystem interaction and timing; delegates every
// text-to-data transform to the core layer.

pub mod config;
pub mod monitor;
pub mod workspace;
