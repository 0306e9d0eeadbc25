//! Units held per asset, in a fixed order

use serde::{Deserialize, Serialize};

use super::ids::AssetCode;
use crate::error::{Error, Result};

/// Ordered mapping of asset code to units held.
///
/// Order is preserved everywhere downstream (asset models, matrix rows,
/// simulation columns). Units must be finite and non-negative and each code
/// appears once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(AssetCode, f64)>", into = "Vec<(AssetCode, f64)>")]
pub struct Holdings {
    entries: Vec<(AssetCode, f64)>,
}

impl Holdings {
    pub fn new<C: AsRef<str>>(entries: impl IntoIterator<Item = (C, f64)>) -> Result<Self> {
        let mut holdings = Self::default();
        for (code, units) in entries {
            holdings.insert(AssetCode::new(code)?, units)?;
        }
        Ok(holdings)
    }

    /// Append a holding, rejecting duplicates and invalid quantities
    pub fn insert(&mut self, code: AssetCode, units: f64) -> Result<()> {
        if !units.is_finite() || units < 0.0 {
            return Err(Error::InvalidHoldings(format!(
                "units for {code} must be finite and non-negative, got {units}"
            )));
        }
        if self.contains(&code) {
            return Err(Error::InvalidHoldings(format!("duplicate asset code {code}")));
        }
        self.entries.push((code, units));
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, code: &AssetCode) -> bool {
        self.entries.iter().any(|(c, _)| c == code)
    }

    #[must_use]
    pub fn units(&self, code: &AssetCode) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, units)| *units)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &AssetCode> {
        self.entries.iter().map(|(code, _)| code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetCode, f64)> {
        self.entries.iter().map(|(code, units)| (code, *units))
    }
}

impl TryFrom<Vec<(AssetCode, f64)>> for Holdings {
    type Error = Error;

    fn try_from(entries: Vec<(AssetCode, f64)>) -> Result<Self> {
        let mut holdings = Self::default();
        for (code, units) in entries {
            holdings.insert(code, units)?;
        }
        Ok(holdings)
    }
}

impl From<Holdings> for Vec<(AssetCode, f64)> {
    fn from(holdings: Holdings) -> Self {
        holdings.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_order() {
        let holdings = Holdings::new([("WDS", 10.0), ("CBA", 5.0), ("TLS", 0.0)]).unwrap();
        let codes: Vec<&str> = holdings.codes().map(AssetCode::as_str).collect();
        assert_eq!(codes, vec!["WDS", "CBA", "TLS"]);
        assert_eq!(holdings.units(&AssetCode::new("cba").unwrap()), Some(5.0));
    }

    #[test]
    fn test_rejects_duplicates_and_negative_units() {
        assert!(matches!(
            Holdings::new([("CBA", 1.0), ("cba", 2.0)]),
            Err(Error::InvalidHoldings(_))
        ));
        assert!(Holdings::new([("CBA", -1.0)]).is_err());
        assert!(Holdings::new([("CBA", f64::NAN)]).is_err());
    }
}
