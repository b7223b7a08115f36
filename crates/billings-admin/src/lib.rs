//! # Billings Admin
//!
//! The billings administrative application: entity definitions for billings
//! and restaurants, instantiated over the generic resource pipeline in
//! `admin-core`, plus the lifecycle orchestration that wires clients,
//! resolver, and the in-memory backend together.

pub mod lifecycle;
pub mod model;
