//! Application layer: session pipeline and handle registry

pub mod registry;
pub mod service;
