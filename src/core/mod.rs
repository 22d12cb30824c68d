// varwatch - core/mod.rs
//
// Core business logic layer: pure text-to-data transforms.
// Must NOT depend on the app layer or perform any polling.

pub mod export;
pub mod extract;
pub mod link;
pub mod model;
