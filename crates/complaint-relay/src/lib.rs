//! Complaint intake and committee mail relay.
//!
//! The [`complaints`] module carries the domain: form validation, report rendering, the
//! relay abstraction with its SMTP implementation, the mail dispatcher, and the HTTP router.
//! [`config`], [`telemetry`] and [`error`] provide the process-level plumbing used by the
//! API service binary.

pub mod complaints;
pub mod config;
pub mod error;
pub mod telemetry;
