//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP sliding window)
//!     → boundary.rs (path containment, symlink rejection)
//!     → csrf.rs (anti-forgery token on state-changing requests)
//!     → headers.rs (restrictive response headers)
//!     → audit.rs (durable record of denials and sensitive operations)
//! ```
//!
//! # Design Decisions
//! - Fail closed: any check failure rejects the request
//! - No trust in client input: paths are canonicalized before comparison,
//!   theme ids are reduced to a slug alphabet before touching the disk
//! - Every denial is logged with the client address and the raw input

pub mod audit;
pub mod boundary;
pub mod csrf;
pub mod headers;
pub mod rate_limit;

pub use boundary::{BoundaryRoot, Denial};
