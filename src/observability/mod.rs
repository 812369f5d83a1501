//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; every security denial carries the
//!   client address and the offending input as fields
//! - Request ID flows through all handlers (see `http::request`)
//! - The separate audit file (`security::audit`) is the durable record;
//!   log output is for operators

pub mod logging;
