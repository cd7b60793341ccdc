//! Size bounds enforced on every persisted record (§3). These are part of
//! the on-disk contract: changing a value here changes what a previously
//! valid attempt tree validates as, so a change must bump the owning
//! record's `schemaVersion`.

/// Maximum byte length of a trace event's `io.outPreview`/`io.errPreview`.
pub const PREVIEW_MAX: usize = 4096;

/// Maximum byte length of a trace event's `input` field, serialized.
pub const TOOL_INPUT_MAX: usize = 64 * 1024;

/// Maximum byte length of a trace event's `enrichment` field, serialized.
pub const ENRICHMENT_MAX: usize = 64 * 1024;

/// Maximum byte length of `feedback.json`'s `result`/`resultJson` body.
pub const FEEDBACK_MAX: usize = 1024 * 1024;

/// Maximum byte length of a note event's `message`.
pub const NOTE_MESSAGE_MAX: usize = 4096;

/// Maximum byte length of a note event's `data`, serialized.
pub const NOTE_DATA_MAX: usize = 64 * 1024;

/// Maximum number of entries in a trace event's `redactionsApplied`.
pub const REDACTIONS_APPLIED_MAX: usize = 32;

/// Maximum byte length of a single redaction name.
pub const REDACTION_NAME_MAX: usize = 64;
