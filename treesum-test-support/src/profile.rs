//! Environment-driven property-test sizing.
//!
//! Property suites read their case count through [`property_cases`] so CI
//! can raise it without touching the tests.

use std::env;

/// Environment variable overriding the number of property-test cases.
pub const PBT_CASES_ENV_KEY: &str = "TREESUM_PBT_CASES";

/// Returns the case count from [`PBT_CASES_ENV_KEY`], or `default_cases`
/// when the variable is unset or not a positive integer.
///
/// # Examples
/// ```
/// use treesum_test_support::profile::property_cases;
///
/// assert!(property_cases(64) > 0);
/// ```
#[must_use]
pub fn property_cases(default_cases: u32) -> u32 {
    let Ok(raw) = env::var(PBT_CASES_ENV_KEY) else {
        return default_cases;
    };
    match parse_cases(&raw) {
        Ok(cases) => cases,
        Err(reason) => {
            tracing::warn!(
                env = PBT_CASES_ENV_KEY,
                raw = %raw,
                reason = %reason,
                "invalid property-test case override; using default",
            );
            default_cases
        }
    }
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    let cases = raw
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("parse error: {error}"))?;
    if cases == 0 {
        return Err("cases must be > 0".to_owned());
    }
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1)]
    #[case(" 250 ", 250)]
    fn parses_positive_counts(#[case] raw: &str, #[case] expected: u32) {
        assert_eq!(parse_cases(raw), Ok(expected));
    }

    #[rstest]
    #[case("0")]
    #[case("-3")]
    #[case("many")]
    fn rejects_invalid_counts(#[case] raw: &str) {
        assert!(parse_cases(raw).is_err());
    }
}
