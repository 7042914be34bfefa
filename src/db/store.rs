//! Storage seams used by the parser, normalizer and verifier.
//!
//! Every operation borrows a store for the duration of one call; the store
//! wraps a caller-owned connection or transaction and never commits or rolls
//! back on its own.

use super::queries;
use crate::error::Result;
use crate::models::{AliasRow, ParsedLine, ReferencePriceRow, Thresholds};
use async_trait::async_trait;
use sqlx::PgConnection;

#[async_trait]
pub trait AliasStore: Send {
    /// Rows whose raw alias is in `raw_keys` or whose folded alias is in
    /// `folded_keys`. Implementations must answer with a single lookup.
    async fn fetch_aliases(&mut self, raw_keys: &[String], folded_keys: &[String]) -> Result<Vec<AliasRow>>;
}

#[async_trait]
pub trait ReferencePriceStore: Send {
    /// Mean historical price per item; items without data are simply absent.
    async fn fetch_reference_prices(&mut self, item_ids: &[String]) -> Result<Vec<ReferencePriceRow>>;
}

#[async_trait]
pub trait ThresholdStore: Send {
    async fn fetch_thresholds(&mut self, profile_code: &str) -> Result<Option<Thresholds>>;
}

#[async_trait]
pub trait EvidenceStore: Send {
    async fn evidence_table_exists(&mut self) -> Result<bool>;

    /// Append-only; there is no update or delete counterpart.
    async fn append_parsed_lines(&mut self, lines: &[ParsedLine], source: Option<&str>) -> Result<u64>;
}

/// Postgres-backed store over a borrowed connection (a transaction derefs to one).
pub struct PgStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgStore<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl AliasStore for PgStore<'_> {
    async fn fetch_aliases(&mut self, raw_keys: &[String], folded_keys: &[String]) -> Result<Vec<AliasRow>> {
        Ok(queries::fetch_aliases(&mut *self.conn, raw_keys, folded_keys).await?)
    }
}

#[async_trait]
impl ReferencePriceStore for PgStore<'_> {
    async fn fetch_reference_prices(&mut self, item_ids: &[String]) -> Result<Vec<ReferencePriceRow>> {
        Ok(queries::fetch_reference_prices(&mut *self.conn, item_ids).await?)
    }
}

#[async_trait]
impl ThresholdStore for PgStore<'_> {
    async fn fetch_thresholds(&mut self, profile_code: &str) -> Result<Option<Thresholds>> {
        Ok(queries::fetch_thresholds(&mut *self.conn, profile_code).await?)
    }
}

#[async_trait]
impl EvidenceStore for PgStore<'_> {
    async fn evidence_table_exists(&mut self) -> Result<bool> {
        Ok(queries::evidence_table_exists(&mut *self.conn).await?)
    }

    async fn append_parsed_lines(&mut self, lines: &[ParsedLine], source: Option<&str>) -> Result<u64> {
        Ok(queries::insert_parsed_lines(&mut *self.conn, lines, source).await?)
    }
}
