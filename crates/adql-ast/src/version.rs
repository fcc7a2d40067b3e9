//! ADQL language versions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported grammar versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum AdqlVersion {
    #[serde(rename = "2.0")]
    V2_0,
    #[default]
    #[serde(rename = "2.1")]
    V2_1,
}

impl AdqlVersion {
    pub const ALL: [AdqlVersion; 2] = [AdqlVersion::V2_0, AdqlVersion::V2_1];

    pub const fn as_str(&self) -> &'static str {
        match self {
            AdqlVersion::V2_0 => "2.0",
            AdqlVersion::V2_1 => "2.1",
        }
    }
}

impl fmt::Display for AdqlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown version string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ADQL version \"{0}\" (expected 2.0 or 2.1)")]
pub struct UnknownVersion(pub String);

impl FromStr for AdqlVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "2.0" | "2" => Ok(AdqlVersion::V2_0),
            "2.1" => Ok(AdqlVersion::V2_1),
            other => Err(UnknownVersion(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_order() {
        assert_eq!("2.0".parse::<AdqlVersion>(), Ok(AdqlVersion::V2_0));
        assert_eq!("v2.1".parse::<AdqlVersion>(), Ok(AdqlVersion::V2_1));
        assert!("3.0".parse::<AdqlVersion>().is_err());
        assert!(AdqlVersion::V2_0 < AdqlVersion::V2_1);
        assert_eq!(AdqlVersion::default().to_string(), "2.1");
    }
}
