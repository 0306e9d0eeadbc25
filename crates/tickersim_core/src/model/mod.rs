mod grid;
mod holdings;
mod ids;
mod matrix;
mod prices;
mod results;
mod returns;

pub use grid::Grid;
pub use holdings::Holdings;
pub use ids::{AssetCode, Market};
pub use matrix::{CorrelationMatrix, CovarianceMatrix};
pub use prices::{PriceBar, PricePoint, PriceSeries};
pub use results::{
    AutocorrelationMeasure, AutocorrelationRow, AutocorrelationTable, BalancePaths,
    CorrelatedReturns, CorrelatedUniforms, FrontierPoint, HoldingRow, OptimizationScatter,
};
pub use returns::{AlignedReturns, LogReturnSeries, align_returns};
