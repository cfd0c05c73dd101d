use anyhow::{Context, Result};
use std::str::FromStr;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse an optional CLI value, naming the flag in the error.
pub fn parse_flag<T>(flag: &str, raw: Option<&str>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("invalid --{flag} value '{value}'"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use augdrill_core::{Tier, TierMode, TrainingMode};

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn parse_flag_handles_missing_blank_and_invalid() {
        assert_eq!(parse_flag::<TierMode>("tier-mode", None).unwrap(), None);
        assert_eq!(parse_flag::<TierMode>("tier-mode", Some("  ")).unwrap(), None);
        assert_eq!(
            parse_flag::<TierMode>("tier-mode", Some("gold")).unwrap(),
            Some(TierMode::Fixed(Tier::Gold))
        );
        assert_eq!(
            parse_flag::<TrainingMode>("training-mode", Some("4-2")).unwrap(),
            Some(TrainingMode::Augment42)
        );
        let err = parse_flag::<TrainingMode>("training-mode", Some("5-1")).unwrap_err();
        assert!(err.to_string().contains("--training-mode"));
    }
}
