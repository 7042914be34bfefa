pub mod normalization;
pub mod parsed_line;
pub mod price_check;
pub mod rows;

pub use normalization::{NormStrategy, NormalizationResult};
pub use parsed_line::{ParseRequest, ParseStatus, ParsedLine, DEFAULT_CURRENCY};
pub use price_check::{
    OfferLine, PriceCheckResult, PriceVerdict, Thresholds, DEFAULT_PROFILE,
};
pub use rows::{AliasRow, ReferencePriceRow, ThresholdRow};
