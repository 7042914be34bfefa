use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Alias dictionary row (`couche_b.procurement_dict_aliases`)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AliasRow {
    pub alias_raw: String,
    pub normalized_alias: String,
    pub item_id: String,
}

/// Mean historical price for one item
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReferencePriceRow {
    pub item_id: String,
    pub ref_price: BigDecimal,
}

/// Threshold pair of one profile (`public.scoring_configs`)
#[derive(Debug, Clone, FromRow)]
pub struct ThresholdRow {
    pub ratio_acceptable: BigDecimal,
    pub ratio_eleve: BigDecimal,
}
