mod amount;
mod bracket;
mod composite_request;
mod levy;
mod liability;
mod tax_category;

pub use amount::{Bucket, LooseAmount, coerce_amount};
pub use bracket::Bracket;
pub use composite_request::{CompositeRequest, ProfitAndLoss, TaxAdjustments};
pub use levy::{Levy, LevyAmount};
pub use liability::LiabilityResult;
pub use tax_category::{RateEntry, TaxCategory};
