//! CLI Exit Code Registry
//!
//! Single source of truth for `dentaldash` exit codes. Scripts rely on them.
//!
//! | Range   | Domain       | Description                              |
//! |---------|--------------|------------------------------------------|
//! | 0       | Universal    | Success                                  |
//! | 1       | Universal    | General error (unspecified)              |
//! | 2       | Universal    | CLI usage error (bad args)               |
//! | 60-69   | conciliation | Config and input loading                 |
//!
//! Unmatched records are a normal reporting outcome and never change the
//! exit code.

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments (page 0, limit 0, ...).
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Conciliation (60-69)
// =============================================================================

/// Config file failed to parse or validate.
pub const EXIT_CONCILIATION_INVALID_CONFIG: u8 = 60;

/// Runtime failure: unreadable file, malformed CSV, bad amount, write error.
pub const EXIT_CONCILIATION_RUNTIME: u8 = 61;
