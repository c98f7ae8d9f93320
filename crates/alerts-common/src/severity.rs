//! NWS alert severity tiers.
//!
//! This is the single severity enumeration used by every renderer and
//! summary in the workspace. Colors live in `alerts-renderer::style`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// NWS-defined severity, parsed case-insensitively.
///
/// Anything unrecognized (including an empty string) maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Unknown,
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl Severity {
    /// All tiers, most severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Extreme,
        Severity::Severe,
        Severity::Moderate,
        Severity::Minor,
        Severity::Unknown,
    ];

    /// Rank used to pick the "best" severity among several alerts.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Extreme => 5,
            Severity::Severe => 4,
            Severity::Moderate => 3,
            Severity::Minor => 2,
            Severity::Unknown => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Extreme => "Extreme",
            Severity::Severe => "Severe",
            Severity::Moderate => "Moderate",
            Severity::Minor => "Minor",
            Severity::Unknown => "Unknown",
        }
    }

    /// Short badge class used by list and popup views.
    pub fn badge_class(&self) -> &'static str {
        match self {
            Severity::Extreme | Severity::Severe => "sev",
            Severity::Moderate => "mod",
            Severity::Minor => "min",
            Severity::Unknown => "unk",
        }
    }

    /// Highest-ranked severity of an iterator, `Unknown` when empty.
    pub fn best<I: IntoIterator<Item = Severity>>(iter: I) -> Severity {
        iter.into_iter()
            .max_by_key(Severity::rank)
            .unwrap_or(Severity::Unknown)
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Unknown
    }
}

impl FromStr for Severity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "extreme" => Severity::Extreme,
            "severe" => Severity::Severe,
            "moderate" => Severity::Moderate,
            "minor" => Severity::Minor,
            _ => Severity::Unknown,
        })
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("SEVERE".parse::<Severity>().unwrap(), Severity::Severe);
        assert_eq!("minor".parse::<Severity>().unwrap(), Severity::Minor);
        assert_eq!("bogus".parse::<Severity>().unwrap(), Severity::Unknown);
        assert_eq!("".parse::<Severity>().unwrap(), Severity::Unknown);
    }

    #[test]
    fn test_best_severity() {
        let best = Severity::best([Severity::Minor, Severity::Extreme, Severity::Moderate]);
        assert_eq!(best, Severity::Extreme);
        assert_eq!(Severity::best(std::iter::empty()), Severity::Unknown);
    }

    #[test]
    fn test_serde_roundtrip_as_string() {
        let json = serde_json::to_string(&Severity::Moderate).unwrap();
        assert_eq!(json, "\"Moderate\"");
        let parsed: Severity = serde_json::from_str("\"extreme\"").unwrap();
        assert_eq!(parsed, Severity::Extreme);
    }
}
