use crate::models::{AliasRow, ParsedLine, ReferencePriceRow, ThresholdRow, Thresholds};
use sqlx::types::Json;
use sqlx::PgConnection;

/// Rows per INSERT statement when appending evidence
const INSERT_CHUNK: usize = 1000;

/// Alias rows matching either key set, in one round trip
pub async fn fetch_aliases(
    conn: &mut PgConnection,
    raw_keys: &[String],
    folded_keys: &[String],
) -> Result<Vec<AliasRow>, sqlx::Error> {
    sqlx::query_as::<_, AliasRow>(
        r#"
        SELECT alias_raw, normalized_alias, item_id
        FROM couche_b.procurement_dict_aliases
        WHERE alias_raw = ANY($1)
           OR normalized_alias = ANY($2)
        "#,
    )
    .bind(raw_keys)
    .bind(folded_keys)
    .fetch_all(conn)
    .await
}

/// Mean observed average price per item (one aggregate for all ids)
pub async fn fetch_reference_prices(
    conn: &mut PgConnection,
    item_ids: &[String],
) -> Result<Vec<ReferencePriceRow>, sqlx::Error> {
    sqlx::query_as::<_, ReferencePriceRow>(
        r#"
        SELECT item_id, AVG(price_avg) AS ref_price
        FROM couche_b.mercuriale_raw_queue
        WHERE item_id = ANY($1)
          AND parse_status IN ('ok', 'partial')
          AND price_avg IS NOT NULL
        GROUP BY item_id
        "#,
    )
    .bind(item_ids)
    .fetch_all(conn)
    .await
}

/// Threshold pair of a profile, if configured
pub async fn fetch_thresholds(
    conn: &mut PgConnection,
    profile_code: &str,
) -> Result<Option<Thresholds>, sqlx::Error> {
    let row = sqlx::query_as::<_, ThresholdRow>(
        r#"
        SELECT price_ratio_acceptable::numeric AS ratio_acceptable,
               price_ratio_eleve::numeric      AS ratio_eleve
        FROM public.scoring_configs
        WHERE profile_code = $1
        LIMIT 1
        "#,
    )
    .bind(profile_code)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|r| Thresholds::new(r.ratio_acceptable, r.ratio_eleve)))
}

pub async fn evidence_table_exists(conn: &mut PgConnection) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM information_schema.tables
        WHERE table_schema = 'couche_b'
          AND table_name = 'mercuriale_raw_queue'
        "#,
    )
    .fetch_optional(conn)
    .await?;

    Ok(found.is_some())
}

/// Append parsed lines to the evidence queue, one row each. Returns rows written.
pub async fn insert_parsed_lines(
    conn: &mut PgConnection,
    lines: &[ParsedLine],
    source: Option<&str>,
) -> Result<u64, sqlx::Error> {
    if lines.is_empty() {
        return Ok(0);
    }

    let start_time = std::time::Instant::now();
    let mut written = 0u64;

    for chunk in lines.chunks(INSERT_CHUNK) {
        let mut query_builder = sqlx::QueryBuilder::new(
            "INSERT INTO couche_b.mercuriale_raw_queue (
                raw_line, source, parse_status,
                designation_raw, unite_raw,
                price_min, price_avg, price_max,
                currency, item_id, strategy, score, parse_errors
            ) ",
        );

        query_builder.push_values(chunk, |mut b, line| {
            let norm = line.normalization.as_ref();
            b.push_bind(&line.raw_line)
                .push_bind(source)
                .push_bind(line.status.as_str())
                .push_bind(&line.designation)
                .push_bind(&line.unit)
                .push_bind(&line.price_min)
                .push_bind(&line.price_avg)
                .push_bind(&line.price_max)
                .push_bind(&line.currency)
                .push_bind(norm.and_then(|n| n.item_id.as_deref()))
                .push_bind(norm.map(|n| n.strategy.as_str()))
                .push_bind(norm.map(|n| n.score))
                .push_bind(Json(&line.parse_errors));
        });

        match query_builder.build().execute(&mut *conn).await {
            Ok(result) => written += result.rows_affected(),
            Err(e) => {
                tracing::error!(
                    "✗ evidence INSERT failed after {:?}: {:?}",
                    start_time.elapsed(),
                    e
                );
                return Err(e);
            }
        }
    }

    tracing::info!(
        "✓ evidence INSERT ok, {} rows, took {:?}",
        written,
        start_time.elapsed()
    );
    Ok(written)
}
