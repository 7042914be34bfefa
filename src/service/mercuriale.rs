use crate::config::AppConfig;
use crate::db::PgStore;
use crate::error::Result;
use crate::models::{NormalizationResult, OfferLine, ParseRequest, ParsedLine, PriceCheckResult};
use crate::service::evidence::record_parsed_lines;
use crate::service::normalizer::AliasNormalizer;
use crate::service::parser::LineParser;
use crate::service::price_check;
use crate::service::unit_policy::TrailingTokenPolicy;
use sqlx::PgPool;

/// Composition root: owns the pool and wires the normalizer into the parser and verifier.
pub struct MercurialeService {
    pool: PgPool,
    parser: LineParser<TrailingTokenPolicy>,
    normalizer: AliasNormalizer,
}

impl MercurialeService {
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        Self {
            pool,
            parser: LineParser::new(config.parser.clone()),
            normalizer: AliasNormalizer::new(),
        }
    }

    /// Parse a batch of mercuriale lines, recording them when `persist` is set.
    /// Parsing and recording share one transaction.
    pub async fn parse(&self, request: &ParseRequest) -> Result<Vec<ParsedLine>> {
        let mut tx = self.pool.begin().await?;

        let parsed = {
            let mut store = PgStore::new(&mut *tx);
            let parsed = self
                .parser
                .parse_batch(&mut store, self.normalizer.batch(), &request.lines)
                .await?;

            if request.persist {
                record_parsed_lines(&mut store, &parsed, request.source.as_deref()).await?;
            }
            parsed
        };

        tx.commit().await?;
        Ok(parsed)
    }

    pub async fn normalize(&self, aliases: &[String]) -> Result<Vec<NormalizationResult>> {
        let mut conn = self.pool.acquire().await?;
        let mut store = PgStore::new(&mut *conn);
        self.normalizer.normalize_batch(&mut store, aliases).await
    }

    pub async fn check_prices(&self, offers: &[OfferLine]) -> Result<Vec<PriceCheckResult>> {
        let mut conn = self.pool.acquire().await?;
        let mut store = PgStore::new(&mut *conn);
        price_check::analyze_batch(&mut store, self.normalizer.batch(), offers).await
    }

    pub async fn check_price(&self, offer: &OfferLine) -> Result<PriceCheckResult> {
        let mut conn = self.pool.acquire().await?;
        let mut store = PgStore::new(&mut *conn);
        price_check::analyze(&mut store, self.normalizer.batch(), offer).await
    }
}
