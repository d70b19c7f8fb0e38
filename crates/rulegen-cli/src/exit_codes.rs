//! Unified exit codes. Part of the public contract: CI pipelines key off
//! these values.

pub const OK: i32 = 0;
pub const VALIDATION_FAILED: i32 = 1; // Pack failed consistency validation
pub const INPUT_ERROR: i32 = 2; // Unreadable/malformed inputs or generation abort
