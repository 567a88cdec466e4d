//! Operation-boundary logging macros
//!
//! Callers need `tracing` among their own dependencies.

/// Log the start of an operation
///
/// ```
/// # use geodelta_core::log_op_start;
/// log_op_start!("generate_diff");
/// log_op_start!("generate_diff", atlas = "before");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use geodelta_core::log_op_end;
/// log_op_end!("generate_diff", duration_ms = 3);
/// log_op_end!("generate_diff", duration_ms = 3, diff_count = 12);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation. `$err` is anything convertible into `GdError`.
///
/// ```
/// # use geodelta_core::log_op_error;
/// use geodelta_core::errors::{GdError, GdErrorKind};
///
/// let err = GdError::new(GdErrorKind::NotFound).with_message("no such shard");
/// log_op_error!("load_snapshot", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let gd_err: $crate::errors::GdError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?gd_err.kind(),
            err_code = gd_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let gd_err: $crate::errors::GdError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?gd_err.kind(),
            err_code = gd_err.code(),
            $($field)*
        );
    }};
}
