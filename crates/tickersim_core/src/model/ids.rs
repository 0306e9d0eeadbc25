//! Identifiers for assets and the exchanges they are quoted on

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ticker code of an asset within an analysis (e.g. `CBA`, `AAPL`)
///
/// Codes are trimmed and upper-cased on construction so `"cba "` and `"CBA"`
/// refer to the same holding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetCode(String);

impl AssetCode {
    pub fn new(code: impl AsRef<str>) -> Result<Self> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(Error::InvalidHoldings("asset code cannot be empty".into()));
        }
        Ok(Self(code.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AssetCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<AssetCode> for String {
    fn from(code: AssetCode) -> Self {
        code.0
    }
}

/// Exchange an asset code is resolved against.
///
/// Only affects the symbol handed to the price source, never the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Market {
    /// Australian Securities Exchange, symbols carry a `.AX` suffix
    #[default]
    Asx,
    /// US listings (NASDAQ/NYSE), symbols are used as-is
    Us,
}

impl Market {
    /// Provider symbol for an asset code on this market
    #[must_use]
    pub fn resolve(&self, code: &AssetCode) -> String {
        match self {
            Market::Asx => format!("{}.AX", code.as_str()),
            Market::Us => code.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_normalized() {
        let code = AssetCode::new("  cba ").unwrap();
        assert_eq!(code.as_str(), "CBA");
        assert!(AssetCode::new("   ").is_err());
    }

    #[test]
    fn test_market_resolution() {
        let code = AssetCode::new("WDS").unwrap();
        assert_eq!(Market::Asx.resolve(&code), "WDS.AX");
        assert_eq!(Market::Us.resolve(&code), "WDS");
    }
}
