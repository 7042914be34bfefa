#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use mercuriale_pricecheck::db::{AliasStore, EvidenceStore, ReferencePriceStore, ThresholdStore};
use mercuriale_pricecheck::models::{AliasRow, NormalizationResult, ParsedLine, ReferencePriceRow, Thresholds};
use mercuriale_pricecheck::service::{AliasNormalizer, BatchResolver};
use mercuriale_pricecheck::{CoreError, Result};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// In-memory store with lookup counters.
#[derive(Default)]
pub struct MemoryStore {
    pub aliases: Vec<AliasRow>,
    pub prices: HashMap<String, BigDecimal>,
    pub thresholds: HashMap<String, Thresholds>,
    pub evidence_table: bool,
    pub recorded: Vec<(ParsedLine, Option<String>)>,

    pub alias_lookups: usize,
    pub price_lookups: usize,
    pub threshold_lookups: Vec<String>,

    /// Every lookup fails with a pool timeout
    pub fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            evidence_table: true,
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias_raw: &str, normalized_alias: &str, item_id: &str) -> Self {
        self.aliases.push(AliasRow {
            alias_raw: alias_raw.to_string(),
            normalized_alias: normalized_alias.to_string(),
            item_id: item_id.to_string(),
        });
        self
    }

    pub fn with_price(mut self, item_id: &str, price: &str) -> Self {
        self.prices.insert(item_id.to_string(), dec(price));
        self
    }

    pub fn with_thresholds(mut self, profile: &str, acceptable: &str, eleve: &str) -> Self {
        self.thresholds
            .insert(profile.to_string(), Thresholds::new(dec(acceptable), dec(eleve)));
        self
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(CoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl AliasStore for MemoryStore {
    async fn fetch_aliases(&mut self, raw_keys: &[String], folded_keys: &[String]) -> Result<Vec<AliasRow>> {
        self.check()?;
        self.alias_lookups += 1;
        Ok(self
            .aliases
            .iter()
            .filter(|row| raw_keys.contains(&row.alias_raw) || folded_keys.contains(&row.normalized_alias))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReferencePriceStore for MemoryStore {
    async fn fetch_reference_prices(&mut self, item_ids: &[String]) -> Result<Vec<ReferencePriceRow>> {
        self.check()?;
        self.price_lookups += 1;
        Ok(item_ids
            .iter()
            .filter_map(|id| {
                self.prices.get(id).map(|p| ReferencePriceRow {
                    item_id: id.clone(),
                    ref_price: p.clone(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl ThresholdStore for MemoryStore {
    async fn fetch_thresholds(&mut self, profile_code: &str) -> Result<Option<Thresholds>> {
        self.check()?;
        self.threshold_lookups.push(profile_code.to_string());
        Ok(self.thresholds.get(profile_code).cloned())
    }
}

#[async_trait]
impl EvidenceStore for MemoryStore {
    async fn evidence_table_exists(&mut self) -> Result<bool> {
        self.check()?;
        Ok(self.evidence_table)
    }

    async fn append_parsed_lines(&mut self, lines: &[ParsedLine], source: Option<&str>) -> Result<u64> {
        self.check()?;
        for line in lines {
            self.recorded.push((line.clone(), source.map(str::to_string)));
        }
        Ok(lines.len() as u64)
    }
}

/// Resolver that counts batch calls before delegating to the real normalizer.
pub struct CountingResolver<'a> {
    pub calls: &'a AtomicUsize,
    pub batch_sizes: &'a std::sync::Mutex<Vec<usize>>,
}

#[async_trait]
impl<'a, S> BatchResolver<S> for CountingResolver<'a>
where
    S: AliasStore + ?Sized,
{
    async fn resolve_batch(self, store: &mut S, aliases: &[String]) -> Result<Vec<NormalizationResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(aliases.len());
        AliasNormalizer::new().normalize_batch(store, aliases).await
    }
}
