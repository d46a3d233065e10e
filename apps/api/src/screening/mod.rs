//! Screening flow: one in-memory session per candidate, driven phase by phase.

pub mod controller;
pub mod handlers;
pub mod phase;
pub mod registry;
pub mod session;
pub mod validation;
