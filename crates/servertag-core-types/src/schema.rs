//! Canonical schema constants for structured logging and events
//!
//! The logging macros emit these keys as bare identifiers; consumers such
//! as the test capture layer look events up by these names.

// Operation boundary fields
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Collection sizes
pub const FIELD_HOST_COUNT: &str = "host_count";
pub const FIELD_DIFF_COUNT: &str = "diff_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
