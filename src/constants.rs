// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you the story
//! of how the system operates: what the Notion API allows, how retries
//! back off, how database creation is paced.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Maximum number of properties the Notion API accepts on one database.
///
/// Schemas beyond this are truncated with a warning rather than failing
/// the whole database creation.
pub const NOTION_MAX_PROPERTIES_PER_DATABASE: usize = 100;

/// Maximum length of database, property, and page names.
///
/// The Notion API rejects names longer than 2000 characters.
pub const NOTION_MAX_NAME_LENGTH: usize = 2000;

/// Formula expressions beyond this length are flagged as "may be too
/// complex" — a validation warning, never an error.
pub const NOTION_MAX_FORMULA_LENGTH: usize = 2000;

/// The property name synthesized when a database schema would otherwise
/// have no title property (the Notion API requires exactly one).
pub const SYNTHETIC_TITLE_PROPERTY: &str = "Name";

// ---------------------------------------------------------------------------
// Rate-limit backoff
// ---------------------------------------------------------------------------

/// How many times a rate-limited operation is retried before the error
/// is allowed to escape.
pub const BACKOFF_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff. The n-th retry sleeps
/// `base * 2^n` plus jitter.
pub const BACKOFF_BASE_DELAY_MS: u64 = 1000;

/// Upper bound of the random jitter added to each backoff sleep.
pub const BACKOFF_JITTER_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// Deployment pacing
// ---------------------------------------------------------------------------
//
// Notion's steady-state rate limit is roughly 3 requests per second.
// Database creation is paced below that with a progressive delay that
// grows with the workspace's complexity. Load shedding, not correctness.

/// Fixed delay after every database creation, successful or not.
pub const INTER_DATABASE_BASE_DELAY_MS: u64 = 500;

/// Per-step increment of the progressive delay: the n-th database waits
/// an extra `n * complexity * step` milliseconds.
pub const INTER_DATABASE_STEP_DELAY_MS: u64 = 100;

/// Cap on the complexity factor (the database count) used in the
/// progressive delay, so huge specs don't pace themselves into hours.
pub const DATABASE_COMPLEXITY_CAP: usize = 10;
