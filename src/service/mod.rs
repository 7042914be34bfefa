pub mod amounts;
pub mod evidence;
pub mod mercuriale;
pub mod normalizer;
pub mod parser;
pub mod price_check;
pub mod unit_policy;

pub use evidence::record_parsed_lines;
pub use mercuriale::MercurialeService;
pub use normalizer::{fold_alias, AliasNormalizer, BatchResolver, NormalizerBatch};
pub use parser::{group_lines, LineGroup, LineParser};
pub use price_check::{analyze, analyze_batch, ThresholdCache};
pub use unit_policy::{TrailingTokenPolicy, UnitPolicy};
