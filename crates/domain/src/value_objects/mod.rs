pub mod amount;
pub mod position_data;
pub mod price;
pub mod price_range;

pub use amount::Amount;
pub use position_data::{
    AuditTrail, FeeYield, PositionData, PriceSource, RangeAnalytics, UsdValuation,
};
pub use price::Price;
pub use price_range::PriceRange;
