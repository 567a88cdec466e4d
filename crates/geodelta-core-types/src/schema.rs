//! Canonical schema constants for structured logging
//!
//! Log events and error reports use these keys so captured output can be
//! asserted on and machine-parsed consistently.

// Envelope fields
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Entity identity
pub const FIELD_ITEM_TYPE: &str = "item_type";
pub const FIELD_IDENTIFIER: &str = "identifier";
pub const FIELD_ATLAS: &str = "atlas";

// Diff / apply counters
pub const FIELD_DIFF_COUNT: &str = "diff_count";
pub const FIELD_CHANGE_COUNT: &str = "change_count";
pub const FIELD_ROUND: &str = "round";
pub const FIELD_PENDING: &str = "pending";

// Batch orchestration
pub const FIELD_SHARD: &str = "shard";
pub const FIELD_THREADS: &str = "threads";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
