//! EduTrack Backend Library
//!
//! Student result records with derived grades, behind role-gated access.
//! The binary in `main.rs` wires these modules into an HTTP server; tests
//! drive them directly.

pub mod api;
pub mod auth;
pub mod config;
pub mod grading;
pub mod middleware;
pub mod policy;
pub mod service;
pub mod students;
