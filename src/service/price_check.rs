//! Read-only price verification of offer lines against mercuriale reference prices.
//!
//! Per batch: one normalizer call, one reference-price aggregate, one
//! threshold lookup per distinct profile (cached for the call).

use crate::db::{AliasStore, ReferencePriceStore, ThresholdStore};
use crate::error::Result;
use crate::models::{
    OfferLine, PriceCheckResult, PriceVerdict, Thresholds, DEFAULT_PROFILE,
};
use crate::service::normalizer::BatchResolver;
use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexSet;
use std::collections::HashMap;

pub const FALLBACK_NOTE: &str = "fallback hardcoded -- scoring_configs empty, using 1.05/1.20";
pub const UNRESOLVED_NOTE: &str = "alias UNRESOLVED -- no mercuriale match possible";

/// Where a profile's thresholds came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSource {
    Profile,
    DefaultProfile,
    Hardcoded,
}

#[derive(Debug, Clone)]
pub struct ResolvedThresholds {
    pub thresholds: Thresholds,
    pub source: ThresholdSource,
}

/// Per-call threshold cache: named profile, then GENERIC, then the hardcoded pair.
#[derive(Debug, Default)]
pub struct ThresholdCache {
    resolved: HashMap<String, ResolvedThresholds>,
}

impl ThresholdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get<S>(&mut self, store: &mut S, profile_code: &str) -> Result<ResolvedThresholds>
    where
        S: ThresholdStore + ?Sized,
    {
        if let Some(hit) = self.resolved.get(profile_code) {
            return Ok(hit.clone());
        }

        let resolved = match store.fetch_thresholds(profile_code).await? {
            Some(thresholds) => ResolvedThresholds {
                thresholds,
                source: if profile_code == DEFAULT_PROFILE {
                    ThresholdSource::DefaultProfile
                } else {
                    ThresholdSource::Profile
                },
            },
            None if profile_code == DEFAULT_PROFILE => ResolvedThresholds {
                thresholds: Thresholds::hardcoded(),
                source: ThresholdSource::Hardcoded,
            },
            None => self.default_profile(store).await?,
        };

        self.resolved.insert(profile_code.to_string(), resolved.clone());
        Ok(resolved)
    }

    async fn default_profile<S>(&mut self, store: &mut S) -> Result<ResolvedThresholds>
    where
        S: ThresholdStore + ?Sized,
    {
        if let Some(hit) = self.resolved.get(DEFAULT_PROFILE) {
            return Ok(hit.clone());
        }

        let resolved = match store.fetch_thresholds(DEFAULT_PROFILE).await? {
            Some(thresholds) => ResolvedThresholds {
                thresholds,
                source: ThresholdSource::DefaultProfile,
            },
            None => ResolvedThresholds {
                thresholds: Thresholds::hardcoded(),
                source: ThresholdSource::Hardcoded,
            },
        };

        self.resolved.insert(DEFAULT_PROFILE.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// True once any profile in this call fell through to the hardcoded pair.
    pub fn used_hardcoded(&self) -> bool {
        self.resolved
            .values()
            .any(|r| r.source == ThresholdSource::Hardcoded)
    }
}

/// Analyze a batch of offers. Output is 1:1 with `offers`, in order.
///
/// Only storage failures and invalid offers (non-positive price or
/// quantity) are errors; every data gap becomes a verdict plus notes.
pub async fn analyze_batch<S, R>(store: &mut S, resolver: R, offers: &[OfferLine]) -> Result<Vec<PriceCheckResult>>
where
    S: AliasStore + ReferencePriceStore + ThresholdStore + ?Sized,
    R: BatchResolver<S>,
{
    if offers.is_empty() {
        return Ok(Vec::new());
    }
    for offer in offers {
        offer.validate()?;
    }

    // Step 1: one normalizer call for all aliases
    let aliases: Vec<String> = offers.iter().map(|o| o.alias_raw.clone()).collect();
    let normalizations = resolver.resolve_batch(&mut *store, &aliases).await?;

    // Step 2: distinct resolved items, order preserved
    let item_ids: IndexSet<String> = normalizations
        .iter()
        .filter_map(|n| n.item_id.clone())
        .collect();

    // Step 3: one aggregate query for reference prices
    let mut reference_prices: HashMap<String, BigDecimal> = HashMap::new();
    if !item_ids.is_empty() {
        let ids: Vec<String> = item_ids.into_iter().collect();
        for row in store.fetch_reference_prices(&ids).await? {
            reference_prices.insert(row.item_id, row.ref_price);
        }
    }

    // Step 4: thresholds per distinct profile
    let mut cache = ThresholdCache::new();
    let profiles: IndexSet<&str> = offers.iter().map(|o| o.profile_code.as_str()).collect();
    let mut thresholds: HashMap<&str, ResolvedThresholds> = HashMap::with_capacity(profiles.len());
    for profile in profiles {
        let resolved = cache.get(&mut *store, profile).await?;
        thresholds.insert(profile, resolved);
    }
    let fallback_used = cache.used_hardcoded();
    if fallback_used {
        tracing::warn!("no threshold profile configured; hardcoded 1.05/1.20 applied to the whole batch");
    }

    // Step 5: independent verdict per offer
    let mut results = Vec::with_capacity(offers.len());
    for (offer, normalization) in offers.iter().zip(normalizations) {
        let mut notes = Vec::new();
        if fallback_used {
            notes.push(FALLBACK_NOTE.to_string());
        }

        let resolved = &thresholds[offer.profile_code.as_str()];
        if resolved.source == ThresholdSource::DefaultProfile && offer.profile_code != DEFAULT_PROFILE {
            notes.push(format!(
                "profile '{}' not configured -- {} thresholds applied",
                offer.profile_code, DEFAULT_PROFILE
            ));
        }

        let submitted_total = offer.submitted_total();
        let item_id = normalization.item_id.clone();
        let reference = item_id.as_ref().and_then(|id| reference_prices.get(id));

        let (verdict, ratio) = match (&item_id, reference) {
            (None, _) => {
                notes.push(UNRESOLVED_NOTE.to_string());
                (PriceVerdict::NoRef, None)
            }
            (Some(id), None) => {
                notes.push(format!("item_id '{}' resolved but no mercuriale data", id));
                (PriceVerdict::NoRef, None)
            }
            (Some(id), Some(reference)) if *reference <= BigDecimal::zero() => {
                notes.push(format!(
                    "item_id '{}' reference price {} is not positive -- ratio undefined",
                    id, reference
                ));
                (PriceVerdict::NoRef, None)
            }
            (Some(_), Some(reference)) => {
                let ratio = (&submitted_total / reference).round(6);
                let t = &resolved.thresholds;
                let verdict = if ratio <= t.ratio_acceptable {
                    PriceVerdict::WithinRef
                } else if ratio > t.ratio_eleve {
                    notes.push(format!(
                        "ratio {} > threshold_eleve {} -- significantly above ref",
                        ratio.round(4),
                        t.ratio_eleve
                    ));
                    PriceVerdict::AboveRef
                } else {
                    notes.push(format!(
                        "ratio {} > threshold_acceptable {} -- moderately above ref",
                        ratio.round(4),
                        t.ratio_acceptable
                    ));
                    PriceVerdict::AboveRef
                };
                (verdict, Some(ratio))
            }
        };

        results.push(PriceCheckResult {
            alias_raw: offer.alias_raw.clone(),
            item_id,
            submitted_total: submitted_total.round(4),
            reference_price: reference.map(|r| r.round(4)),
            ratio,
            verdict,
            profile_code: offer.profile_code.clone(),
            notes,
            normalization,
        });
    }

    let no_ref = results.iter().filter(|r| r.verdict == PriceVerdict::NoRef).count();
    tracing::info!(
        "price check: {} offers, {} profiles, {} without reference",
        results.len(),
        thresholds.len(),
        no_ref
    );

    Ok(results)
}

/// Analyze a single offer
pub async fn analyze<S, R>(store: &mut S, resolver: R, offer: &OfferLine) -> Result<PriceCheckResult>
where
    S: AliasStore + ReferencePriceStore + ThresholdStore + ?Sized,
    R: BatchResolver<S>,
{
    let mut results = analyze_batch(store, resolver, std::slice::from_ref(offer)).await?;
    // analyze_batch is 1:1 with its input
    Ok(results.remove(0))
}
