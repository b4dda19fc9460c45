//! Integration test utilities for the broadcast hub
//!
//! This crate provides helpers for running end-to-end tests against a live
//! gateway over real WebSocket connections.

pub mod helpers;

pub use helpers::*;
