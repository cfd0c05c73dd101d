//! Centralized tuning constants for the drill engine.
//!
//! Set shape and sampling limits live here so that changing them is a
//! reviewed code change rather than an asset edit.

/// Number of spots in a complete training set.
pub const SPOTS_PER_SET: usize = 20;
/// Options generated per spot: three primaries plus three replacements.
pub const OPTIONS_PER_SPOT: usize = 6;
/// Slots visible at once (A, B, C).
pub const VISIBLE_SLOTS: usize = 3;
/// Smallest option count a spot can be generated with (one primary per slot).
pub const MIN_OPTIONS_PER_SPOT: usize = VISIBLE_SLOTS;

/// Upper bound accepted by a single sampler request.
pub const MAX_SAMPLE_COUNT: usize = 12;

/// Zero-padded width of the sequence suffix in a set id.
pub const SET_SEQ_WIDTH: usize = 4;
/// Marker between the patch and the sequence number in a set id.
pub const SET_SEQ_MARKER: &str = "TS";
/// Slug used when a pro display name has no usable characters.
pub const FALLBACK_PRO_SLUG: &str = "Pro";

// RNG domain tags ----------------------------------------------------------
pub(crate) const RNG_DOMAIN_SPOT: &[u8] = b"augdrill.spot";

// Player-facing messages ---------------------------------------------------
/// Text shown in place of a missing replacement augment.
pub const PLACEHOLDER_MESSAGE: &str = "No replacement available";
