use crate::model::AssetCode;

/// Failure reported by an external price-data collaborator.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised by the statistical and simulation engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Too few prices or returns to fit or analyze
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Degenerate sample or a likelihood search that did not converge
    #[error("distribution fit failed: {0}")]
    Fitting(String),

    /// Price series has no valid close at all
    #[error("no price data available for {0}")]
    NoData(AssetCode),

    /// Operation needs at least two assets
    #[error("operation requires at least 2 assets, portfolio has {found}")]
    InsufficientAssets { found: usize },

    /// Assets share too few trading dates to estimate correlation
    #[error("assets share only {common} common dates, need at least {required}")]
    InsufficientOverlap { common: usize, required: usize },

    /// Matrix is not symmetric/PSD even after stabilization
    #[error("invalid correlation matrix: {0}")]
    InvalidCorrelationMatrix(String),

    #[error("invalid price series: {0}")]
    InvalidPriceSeries(String),

    #[error("invalid holdings: {0}")]
    InvalidHoldings(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    #[error("price source failed for {symbol}: {source}")]
    DataSource {
        symbol: String,
        #[source]
        source: SourceError,
    },
}

impl Error {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
