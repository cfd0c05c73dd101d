//! Training set identifiers.
//! Format: `<PRO><PATCH>TS<NNNN>`, e.g. `Setsuko14.3TS0007`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{FALLBACK_PRO_SLUG, SET_SEQ_MARKER, SET_SEQ_WIDTH};

static SEQ_SUFFIX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"TS(\d{4,})$").ok());

/// Strip everything but ASCII letters and digits from a pro's display name.
#[must_use]
pub fn slugify_pro(display_name: &str) -> String {
    let slug: String = display_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if slug.is_empty() {
        FALLBACK_PRO_SLUG.to_string()
    } else {
        slug
    }
}

fn clean_patch(patch: &str) -> String {
    patch.chars().filter(|c| !c.is_whitespace()).collect()
}

#[must_use]
pub fn format_set_id(pro_slug: &str, patch: &str, seq: u32) -> String {
    format!(
        "{pro_slug}{}{SET_SEQ_MARKER}{seq:0width$}",
        clean_patch(patch),
        width = SET_SEQ_WIDTH
    )
}

/// Sequence number of a set id, if it carries one.
#[must_use]
pub fn parse_set_seq(id: &str) -> Option<u32> {
    let re = SEQ_SUFFIX.as_ref()?;
    re.captures(id.trim())?.get(1)?.as_str().parse().ok()
}

/// Next free id for `display_name` on `patch`: one past the highest
/// sequence among `existing` ids with the same pro and patch prefix.
#[must_use]
pub fn next_set_id<'a, I>(display_name: &str, patch: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let slug = slugify_pro(display_name);
    let prefix = format!("{slug}{}{SET_SEQ_MARKER}", clean_patch(patch));
    let highest = existing
        .into_iter()
        .filter(|id| id.starts_with(&prefix))
        .filter_map(parse_set_seq)
        .max()
        .unwrap_or(0);
    format_set_id(&slug, patch, highest.saturating_add(1))
}
