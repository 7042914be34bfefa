//! Deterministic alias resolution: exact raw match, then exact folded match,
//! then unresolved. No similarity scoring.

use crate::db::AliasStore;
use crate::error::Result;
use crate::models::{NormStrategy, NormalizationResult};
use async_trait::async_trait;
use indexmap::IndexSet;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold text into the dictionary's normalized key: trim, case fold, NFKD, drop combining marks.
pub fn fold_alias(text: &str) -> String {
    let case_folded: String = text
        .trim()
        .chars()
        .flat_map(|c| match c {
            'ß' | 'ẞ' => vec!['s', 's'],
            'ς' => vec!['σ'],
            _ => c.to_lowercase().collect(),
        })
        .collect();

    case_folded.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// The normalizer as seen by the parser and the verifier.
///
/// `resolve_batch` consumes the resolver, so one resolver serves exactly one
/// batch. Implementors should not be `Copy` or `Clone`; a fresh resolver is
/// taken per batch (see [`AliasNormalizer::batch`]).
#[async_trait]
pub trait BatchResolver<S: ?Sized + Send>: Send {
    async fn resolve_batch(self, store: &mut S, aliases: &[String]) -> Result<Vec<NormalizationResult>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AliasNormalizer;

impl AliasNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a batch with exactly one store lookup. Output is 1:1 with `aliases`.
    pub async fn normalize_batch<S>(&self, store: &mut S, aliases: &[String]) -> Result<Vec<NormalizationResult>>
    where
        S: AliasStore + ?Sized,
    {
        // 1. Candidate keys per input (raw = trimmed text, folded = dictionary key)
        let candidates: Vec<(&str, String)> = aliases
            .iter()
            .map(|alias| {
                let trimmed = alias.trim();
                let folded = if trimmed.is_empty() { String::new() } else { fold_alias(trimmed) };
                (trimmed, folded)
            })
            .collect();

        // 2. Deduplicated key sets; duplicates collapse to one key
        let raw_keys: IndexSet<String> = candidates
            .iter()
            .filter(|(raw, _)| !raw.is_empty())
            .map(|(raw, _)| raw.to_string())
            .collect();
        let folded_keys: IndexSet<String> = candidates
            .iter()
            .filter(|(_, folded)| !folded.is_empty())
            .map(|(_, folded)| folded.clone())
            .collect();

        // 3. Single lookup, split into the two maps
        let mut raw_map: HashMap<String, String> = HashMap::new();
        let mut folded_map: HashMap<String, String> = HashMap::new();

        if !raw_keys.is_empty() || !folded_keys.is_empty() {
            let raw_keys: Vec<String> = raw_keys.into_iter().collect();
            let folded_keys: Vec<String> = folded_keys.into_iter().collect();
            let rows = store.fetch_aliases(&raw_keys, &folded_keys).await?;

            for row in rows {
                raw_map.insert(row.alias_raw, row.item_id.clone());
                folded_map.insert(row.normalized_alias, row.item_id);
            }
        }

        // 4. Replay precedence per input
        let results: Vec<NormalizationResult> = aliases
            .iter()
            .zip(candidates)
            .map(|(alias, (trimmed, folded))| {
                if trimmed.is_empty() {
                    return NormalizationResult::unresolved(alias, folded).with_note("blank input");
                }
                if let Some(item_id) = raw_map.get(trimmed) {
                    return NormalizationResult::resolved(alias, folded, item_id.clone(), NormStrategy::ExactRaw);
                }
                if let Some(item_id) = folded_map.get(&folded) {
                    let item_id = item_id.clone();
                    return NormalizationResult::resolved(alias, folded, item_id, NormStrategy::ExactNormalized);
                }
                NormalizationResult::unresolved(alias, folded)
            })
            .collect();

        let resolved = results.iter().filter(|r| r.is_resolved()).count();
        tracing::debug!("normalize_batch: {} aliases, {} resolved", aliases.len(), resolved);

        Ok(results)
    }

    /// Single-use resolver for one batch.
    pub fn batch(&self) -> NormalizerBatch {
        NormalizerBatch { normalizer: *self }
    }

    /// Resolve a single alias
    pub async fn normalize<S>(&self, store: &mut S, alias: &str) -> Result<NormalizationResult>
    where
        S: AliasStore + ?Sized,
    {
        let mut results = self.normalize_batch(store, &[alias.to_string()]).await?;
        Ok(results.pop().unwrap_or_else(|| NormalizationResult::unresolved(alias, fold_alias(alias))))
    }
}

/// Per-batch handle on an [`AliasNormalizer`]; consumed by its one batch.
#[derive(Debug)]
pub struct NormalizerBatch {
    normalizer: AliasNormalizer,
}

#[async_trait]
impl<S> BatchResolver<S> for NormalizerBatch
where
    S: AliasStore + ?Sized,
{
    async fn resolve_batch(self, store: &mut S, aliases: &[String]) -> Result<Vec<NormalizationResult>> {
        self.normalizer.normalize_batch(store, aliases).await
    }
}
