// =============================================================================
// Shared types used across the scanner, service and CLI
// =============================================================================

use serde::{Deserialize, Serialize};

/// When the scan loop stops evaluating tickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPolicy {
    /// Stop at the first eligible recommendation.
    FirstEligible,
    /// Evaluate the whole list and keep the highest profit percentage.
    BestOfAll,
    /// Evaluate the first N tickers regardless of eligibility.
    FixedCount(usize),
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::FirstEligible
    }
}

impl std::fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstEligible => write!(f, "FirstEligible"),
            Self::BestOfAll => write!(f, "BestOfAll"),
            Self::FixedCount(n) => write!(f, "FixedCount({n})"),
        }
    }
}

impl std::str::FromStr for ScanPolicy {
    type Err = String;

    /// Accepts `first`, `best`, or `count:<N>` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "first" | "firsteligible" => Ok(Self::FirstEligible),
            "best" | "bestofall" => Ok(Self::BestOfAll),
            other => other
                .strip_prefix("count:")
                .and_then(|n| n.parse().ok())
                .map(Self::FixedCount)
                .ok_or_else(|| format!("unknown scan policy '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_policies() {
        assert_eq!("first".parse::<ScanPolicy>(), Ok(ScanPolicy::FirstEligible));
        assert_eq!("BEST".parse::<ScanPolicy>(), Ok(ScanPolicy::BestOfAll));
        assert_eq!("count:7".parse::<ScanPolicy>(), Ok(ScanPolicy::FixedCount(7)));
        assert!("count:x".parse::<ScanPolicy>().is_err());
        assert!("random".parse::<ScanPolicy>().is_err());
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&ScanPolicy::FixedCount(3)).unwrap();
        assert_eq!(json, r#"{"FixedCount":3}"#);
        let p: ScanPolicy = serde_json::from_str(r#""BestOfAll""#).unwrap();
        assert_eq!(p, ScanPolicy::BestOfAll);
    }
}
