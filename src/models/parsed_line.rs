use super::NormalizationResult;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "XOF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    Ok,
    Partial,
    Unparseable,
}

impl ParseStatus {
    /// Value accepted by the `parse_status` check constraint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Ok => "ok",
            ParseStatus::Partial => "partial",
            ParseStatus::Unparseable => "unparseable",
        }
    }
}

/// One logical mercuriale line after parsing.
///
/// `raw_line` is evidence: the literal input, or the `" | "`-joined inputs
/// of a multi-line group. It is never trimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLine {
    pub raw_line: String,
    pub designation: Option<String>,
    pub unit: Option<String>,
    pub price_min: Option<BigDecimal>,
    pub price_avg: Option<BigDecimal>,
    pub price_max: Option<BigDecimal>,
    pub currency: String,
    pub status: ParseStatus,
    pub parse_errors: Vec<String>,
    pub normalization: Option<NormalizationResult>,
}

impl ParsedLine {
    /// Empty record for `raw_line`; status starts as UNPARSEABLE until a parse step upgrades it.
    pub fn new(raw_line: impl Into<String>) -> Self {
        Self {
            raw_line: raw_line.into(),
            designation: None,
            unit: None,
            price_min: None,
            price_avg: None,
            price_max: None,
            currency: DEFAULT_CURRENCY.to_string(),
            status: ParseStatus::Unparseable,
            parse_errors: Vec::new(),
            normalization: None,
        }
    }

    pub fn unparseable(raw_line: impl Into<String>, error: impl Into<String>) -> Self {
        let mut line = Self::new(raw_line);
        line.parse_errors.push(error.into());
        line
    }

    pub fn item_id(&self) -> Option<&str> {
        self.normalization.as_ref().and_then(|n| n.item_id.as_deref())
    }
}

/// A batch of raw mercuriale lines submitted for parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseRequest {
    pub lines: Vec<String>,
    #[serde(default)]
    pub persist: bool,
    #[serde(default)]
    pub source: Option<String>,
}
