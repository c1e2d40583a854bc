//! # Gym Access Backend
//!
//! Booking, check-in and live occupancy backend for a company gym.
//!
//! Employees reserve daily gym sessions ahead of time, a front desk checks
//! them in and out, and a live view shows who is inside. Capacity rules
//! (session quota and maximum occupancy) are enforced atomically by the
//! storage layer.
//!
//! ## Architecture
//!
//! - [`models`]: sessions, bookings and their lifecycle, employees, settings
//! - [`db`]: repository traits with in-memory and Postgres implementations
//! - [`services`]: admission state machine, availability, directory, live view
//! - [`http`]: axum REST API with `{ ok, ... }` envelopes
//! - [`api`]: re-exports of the types that cross the HTTP boundary

// RepositoryError carries rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
