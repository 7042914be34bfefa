use crate::db::EvidenceStore;
use crate::error::Result;
use crate::models::ParsedLine;

/// Append parsed lines to the evidence queue.
///
/// Writes nothing (and returns 0) when the queue table has not been
/// migrated yet. Rows are never updated; corrections are new rows.
pub async fn record_parsed_lines<S>(store: &mut S, lines: &[ParsedLine], source: Option<&str>) -> Result<u64>
where
    S: EvidenceStore + ?Sized,
{
    if lines.is_empty() {
        return Ok(0);
    }

    if !store.evidence_table_exists().await? {
        tracing::warn!(
            "evidence table couche_b.mercuriale_raw_queue missing, {} parsed lines not recorded",
            lines.len()
        );
        return Ok(0);
    }

    let written = store.append_parsed_lines(lines, source).await?;
    tracing::debug!("recorded {} parsed lines (source: {:?})", written, source);
    Ok(written)
}
