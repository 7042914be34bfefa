use super::parsed_line::DEFAULT_CURRENCY;
use super::NormalizationResult;
use crate::error::{CoreError, Result};
use bigdecimal::{BigDecimal, One, Zero};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILE: &str = "GENERIC";

fn default_quantity() -> BigDecimal {
    BigDecimal::one()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

/// Offer line item submitted for price verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferLine {
    pub alias_raw: String,
    pub unit_price: BigDecimal,
    #[serde(default = "default_quantity")]
    pub quantity: BigDecimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_profile")]
    pub profile_code: String,
}

impl OfferLine {
    pub fn new(alias_raw: impl Into<String>, unit_price: BigDecimal) -> Self {
        Self {
            alias_raw: alias_raw.into(),
            unit_price,
            quantity: default_quantity(),
            currency: default_currency(),
            profile_code: default_profile(),
        }
    }

    pub fn with_quantity(mut self, quantity: BigDecimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_profile(mut self, profile_code: impl Into<String>) -> Self {
        self.profile_code = profile_code.into();
        self
    }

    /// Unit price and quantity must both be strictly positive.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.unit_price <= BigDecimal::zero() {
            "unit_price must be > 0"
        } else if self.quantity <= BigDecimal::zero() {
            "quantity must be > 0"
        } else {
            return Ok(());
        };
        Err(CoreError::InvalidOffer {
            alias: self.alias_raw.clone(),
            reason: reason.to_string(),
        })
    }

    pub fn submitted_total(&self) -> BigDecimal {
        &self.unit_price * &self.quantity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceVerdict {
    /// ratio <= ratio_acceptable
    WithinRef,
    /// ratio > ratio_acceptable
    AboveRef,
    /// no reference price available
    NoRef,
}

/// Descriptive verdict for one offer line. Carries no ranking or selection field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCheckResult {
    pub alias_raw: String,
    pub item_id: Option<String>,
    pub submitted_total: BigDecimal,
    pub reference_price: Option<BigDecimal>,
    pub ratio: Option<BigDecimal>,
    pub verdict: PriceVerdict,
    pub profile_code: String,
    pub notes: Vec<String>,
    pub normalization: NormalizationResult,
}

/// Ratio thresholds of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub ratio_acceptable: BigDecimal,
    pub ratio_eleve: BigDecimal,
}

impl Thresholds {
    pub fn new(ratio_acceptable: BigDecimal, ratio_eleve: BigDecimal) -> Self {
        Self {
            ratio_acceptable,
            ratio_eleve,
        }
    }

    /// 1.05 / 1.20, used only when no profile row exists at all.
    pub fn hardcoded() -> Self {
        Self::new(BigDecimal::new(105.into(), 2), BigDecimal::new(120.into(), 2))
    }
}
