use anyhow::{Result, bail};
use std::collections::HashSet;

/// Seed metadata used for logic scenarios and strategy analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Token as typed on the command line, when it was not plain decimal.
    pub token: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, token: None }
    }

    #[must_use]
    pub const fn from_token(seed: u64, token: String) -> Self {
        Self {
            seed,
            token: Some(token),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.token
            .clone()
            .unwrap_or_else(|| self.seed.to_string())
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex. Duplicates collapse to the first occurrence; an empty
/// list falls back to seed 1337.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let info = if let Ok(value) = token.parse::<u64>() {
            SeedInfo::from_numeric(value)
        } else if let Ok(value) = token.parse::<i64>() {
            SeedInfo::from_numeric(value.unsigned_abs())
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            SeedInfo::from_token(value, token.to_ascii_lowercase())
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if seen.insert(info.seed) {
            resolved.push(info);
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(1337));
    }

    Ok(resolved)
}
