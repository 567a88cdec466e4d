//! Structured logging for geodelta
//!
//! - `init(profile)` installs the global subscriber once
//! - `log_op_start!`, `log_op_end!` and `log_op_error!` emit the
//!   operation-boundary events every public operation logs
//! - [`test_capture`] records events in memory so tests can assert on them
//!
//! # Usage
//!
//! ```rust
//! use geodelta_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! Boundary events carry `component`, `op` and `event` (`start`, `end` or
//! `end_error`). End events add `duration_ms`; error events add `err_kind`
//! and `err_code`.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
