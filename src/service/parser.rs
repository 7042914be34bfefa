//! Deterministic mercuriale line parser.
//!
//! Raw lines are first grouped (designations may span several lines ahead of
//! their price line), then each group is parsed into exactly one
//! [`ParsedLine`]. Parsing never fails: problems are reported through
//! `status` and `parse_errors`.

use crate::db::AliasStore;
use crate::error::Result;
use crate::models::{NormalizationResult, ParseStatus, ParsedLine};
use crate::service::amounts::{self, parse_amount};
use crate::service::normalizer::BatchResolver;
use crate::service::unit_policy::{TrailingTokenPolicy, UnitPolicy};
use bigdecimal::BigDecimal;
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub const EMPTY_LINE: &str = "EMPTY_LINE";
pub const DECORATIVE_LINE: &str = "decorative or empty line";
pub const UNIT_MISSING: &str = "unit missing";
pub const NO_PRICES_FOUND: &str = "no prices found";

/// Separator between contributing lines in a merged `raw_line`
pub const RAW_LINE_JOIN: &str = " | ";

// Separators, rulers, table borders: "|||", "-----", "==="
static DECORATIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{P}\p{S}\s]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Empty,
    PriceBearing,
    Decorative,
    Text,
}

fn classify(stripped: &str) -> LineKind {
    if stripped.is_empty() {
        LineKind::Empty
    } else if amounts::scan(stripped).triple.is_some() {
        LineKind::PriceBearing
    } else if DECORATIVE.is_match(stripped) {
        LineKind::Decorative
    } else {
        LineKind::Text
    }
}

/// One logical unit of input, producing exactly one [`ParsedLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineGroup {
    /// A blank line, kept verbatim.
    Empty { raw: String },
    /// One or more contributing lines and their merged, trimmed text.
    Data { raws: Vec<String>, text: String },
}

impl LineGroup {
    /// Evidence text: the literal line, or the contributing lines joined with `" | "`.
    pub fn raw_line(&self) -> String {
        match self {
            LineGroup::Empty { raw } => raw.clone(),
            LineGroup::Data { raws, .. } if raws.len() == 1 => raws[0].clone(),
            LineGroup::Data { raws, .. } => raws.join(RAW_LINE_JOIN),
        }
    }
}

#[derive(Default)]
struct Pending {
    raws: Vec<String>,
    stripped: Vec<String>,
}

impl Pending {
    fn push(&mut self, raw: &str, stripped: &str) {
        self.raws.push(raw.to_string());
        self.stripped.push(stripped.to_string());
    }

    fn flush_into(&mut self, groups: &mut Vec<LineGroup>) {
        if self.raws.is_empty() {
            return;
        }
        let text = self.stripped.join(" ");
        groups.push(LineGroup::Data {
            raws: std::mem::take(&mut self.raws),
            text,
        });
        self.stripped.clear();
    }
}

/// Group raw lines. Plain-text lines accumulate until a price line closes
/// the group; blank and decorative lines flush and stand alone.
pub fn group_lines<T: AsRef<str>>(lines: &[T]) -> Vec<LineGroup> {
    let mut groups = Vec::with_capacity(lines.len());
    let mut pending = Pending::default();

    for raw in lines.iter().map(AsRef::as_ref) {
        let stripped = raw.trim();

        match classify(stripped) {
            LineKind::Empty => {
                pending.flush_into(&mut groups);
                groups.push(LineGroup::Empty { raw: raw.to_string() });
            }
            LineKind::PriceBearing => {
                pending.push(raw, stripped);
                pending.flush_into(&mut groups);
            }
            LineKind::Decorative => {
                pending.flush_into(&mut groups);
                groups.push(LineGroup::Data {
                    raws: vec![raw.to_string()],
                    text: stripped.to_string(),
                });
            }
            LineKind::Text => pending.push(raw, stripped),
        }
    }

    // trailing designation fragments without a price line
    pending.flush_into(&mut groups);
    groups
}

/// Line parser with a pluggable unit heuristic.
#[derive(Debug, Clone, Default)]
pub struct LineParser<P = TrailingTokenPolicy> {
    policy: P,
}

impl<P: UnitPolicy> LineParser<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Parse one logical text. `raw_line` of the result is `text` verbatim.
    pub fn parse_text(&self, text: &str) -> ParsedLine {
        let mut line = ParsedLine::new(text);
        self.fill(&mut line, text.trim());
        line
    }

    fn parse_group(&self, group: &LineGroup) -> ParsedLine {
        match group {
            LineGroup::Empty { raw } => ParsedLine::unparseable(raw.as_str(), EMPTY_LINE),
            LineGroup::Data { text, .. } => {
                let mut line = ParsedLine::new(group.raw_line());
                self.fill(&mut line, text);
                line
            }
        }
    }

    fn fill(&self, line: &mut ParsedLine, stripped: &str) {
        // 1. blank / decorative
        if stripped.is_empty() {
            line.parse_errors.push(EMPTY_LINE.to_string());
            line.status = ParseStatus::Unparseable;
            return;
        }
        if DECORATIVE.is_match(stripped) {
            line.parse_errors.push(DECORATIVE_LINE.to_string());
            line.status = ParseStatus::Unparseable;
            return;
        }

        let scanned = amounts::scan(stripped);

        // 2. full min/avg/max triple
        if let Some(triple) = scanned.triple {
            let parsed: std::result::Result<Vec<BigDecimal>, _> = triple
                .iter()
                .map(|span| parse_amount(span.as_str(stripped)))
                .collect();
            let mut parsed = match parsed {
                Ok(a) => a.into_iter(),
                Err(e) => return Self::reject_amount(line, e),
            };
            line.price_min = parsed.next();
            line.price_avg = parsed.next();
            line.price_max = parsed.next();

            let before = stripped[..triple[0].start].trim();
            let after = stripped[triple[2].end..].trim();

            let (designation, mut unit) = self.policy.split_leading(before);
            if unit.is_none() && !after.is_empty() {
                unit = self.policy.trailing_unit(after);
            }
            line.designation = designation;
            line.unit = unit;

            if line.unit.is_none() {
                line.parse_errors.push(UNIT_MISSING.to_string());
                line.status = ParseStatus::Partial;
            } else {
                line.status = ParseStatus::Ok;
            }
            return;
        }

        // 3. incomplete: keep what is there, left to right
        if !scanned.amounts.is_empty() {
            let mut found = Vec::with_capacity(2);
            for span in scanned.amounts.iter().take(2) {
                match parse_amount(span.as_str(stripped)) {
                    Ok(a) => found.push(a),
                    Err(e) => return Self::reject_amount(line, e),
                }
            }
            let mut found = found.into_iter();
            line.price_min = found.next();
            line.price_avg = found.next();
            line.parse_errors.push(format!(
                "found {} price(s) but expected 3 (min/avg/max)",
                scanned.amounts.len()
            ));
            line.designation = Some(stripped.to_string());
            line.status = ParseStatus::Partial;
            return;
        }

        // 4. designation only
        line.designation = Some(stripped.to_string());
        line.parse_errors.push(NO_PRICES_FOUND.to_string());
        line.status = ParseStatus::Partial;
    }

    fn reject_amount(line: &mut ParsedLine, error: bigdecimal::ParseBigDecimalError) {
        line.price_min = None;
        line.price_avg = None;
        line.price_max = None;
        line.parse_errors.push(format!("price parse error: {}", error));
        line.status = ParseStatus::Unparseable;
    }

    /// Parse a batch without touching storage (no normalization).
    pub fn parse_lines<T: AsRef<str>>(&self, lines: &[T]) -> Vec<ParsedLine> {
        group_lines(lines).iter().map(|g| self.parse_group(g)).collect()
    }

    /// Parse a batch and annotate each parsed designation with its
    /// normalization. The resolver runs once for the whole batch over the
    /// distinct designations of non-UNPARSEABLE groups.
    pub async fn parse_batch<S, R>(&self, store: &mut S, resolver: R, lines: &[String]) -> Result<Vec<ParsedLine>>
    where
        S: AliasStore + ?Sized,
        R: BatchResolver<S>,
    {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        // Phase 1-2: group and parse
        let mut parsed = self.parse_lines(lines);

        // Phase 3: one normalization call over distinct designations
        let designations: IndexSet<String> = parsed
            .iter()
            .filter(|p| p.status != ParseStatus::Unparseable)
            .filter_map(|p| p.designation.clone())
            .filter(|d| !d.is_empty())
            .collect();

        let mut by_designation: HashMap<String, NormalizationResult> = HashMap::new();
        if !designations.is_empty() {
            let keys: Vec<String> = designations.into_iter().collect();
            let results = resolver.resolve_batch(&mut *store, &keys).await?;
            by_designation = keys.into_iter().zip(results).collect();
        }

        // Phase 4: join back by designation text
        for line in parsed.iter_mut().filter(|p| p.status != ParseStatus::Unparseable) {
            if let Some(designation) = &line.designation {
                line.normalization = by_designation.get(designation).cloned();
            }
        }

        let unparseable = parsed.iter().filter(|p| p.status == ParseStatus::Unparseable).count();
        tracing::info!(
            "parsed {} lines into {} groups ({} unparseable)",
            lines.len(),
            parsed.len(),
            unparseable
        );

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn parse(text: &str) -> ParsedLine {
        LineParser::<TrailingTokenPolicy>::default().parse_text(text)
    }

    #[test]
    fn simple_line_ok() {
        let line = parse("Agenda Simple Unite 2 500 3 300 4 000");
        assert_eq!(line.status, ParseStatus::Ok);
        assert_eq!(line.designation.as_deref(), Some("Agenda Simple"));
        assert_eq!(line.unit.as_deref(), Some("Unite"));
        assert_eq!(line.price_min, Some(dec("2500")));
        assert_eq!(line.price_avg, Some(dec("3300")));
        assert_eq!(line.price_max, Some(dec("4000")));
        assert!(line.parse_errors.is_empty());
        assert_eq!(line.currency, "XOF");
    }

    #[test]
    fn comma_decimals_and_apostrophes() {
        let line = parse("Stylo Bic Piece 1 250,50 1 300,00 1 400,00");
        assert_eq!(line.price_min, Some(dec("1250.5")));
        assert_eq!(line.price_avg, Some(dec("1300")));
        assert_eq!(line.price_max, Some(dec("1400")));

        let line = parse("Ciment Tonne 85'000 90'000 97'500");
        assert_eq!(line.price_min, Some(dec("85000")));
        assert_eq!(line.price_max, Some(dec("97500")));
    }

    #[test]
    fn amounts_without_separators() {
        let line = parse("Ciment Tonne 85000 90000 97500");
        assert_eq!(line.status, ParseStatus::Ok);
        assert_eq!(line.designation.as_deref(), Some("Ciment"));
        assert_eq!(line.unit.as_deref(), Some("Tonne"));
        assert_eq!(line.price_min, Some(dec("85000")));
        assert_eq!(line.price_avg, Some(dec("90000")));
        assert_eq!(line.price_max, Some(dec("97500")));

        let line = parse("Riz kg 1500 2000 2500");
        assert_eq!(line.status, ParseStatus::Ok);
        assert_eq!(line.price_min, Some(dec("1500")));
        assert_eq!(line.price_max, Some(dec("2500")));
    }

    #[test]
    fn wider_last_amount_is_kept_whole() {
        let line = parse("Riz kg 100 200 3000");
        assert_eq!(line.status, ParseStatus::Ok);
        assert_eq!(line.price_min, Some(dec("100")));
        assert_eq!(line.price_avg, Some(dec("200")));
        assert_eq!(line.price_max, Some(dec("3000")));
        assert!(line.parse_errors.is_empty());
    }

    #[test]
    fn space_between_loose_amounts_reads_as_thousands() {
        let line = parse("Riz 100 kg 200 300");
        assert_eq!(line.status, ParseStatus::Partial);
        assert_eq!(line.price_min, Some(dec("100")));
        assert_eq!(line.price_avg, Some(dec("200300")));
        assert!(line.parse_errors[0].starts_with("found 2 price(s)"));
    }

    #[test]
    fn order_is_kept_not_sorted() {
        let line = parse("Article Piece 300 100 200");
        assert_eq!(line.price_min, Some(dec("300")));
        assert_eq!(line.price_avg, Some(dec("100")));
        assert_eq!(line.price_max, Some(dec("200")));
    }

    #[test]
    fn prices_without_text_is_partial_unit_missing() {
        let line = parse("70 000 73 833 84 000");
        assert_eq!(line.status, ParseStatus::Partial);
        assert!(line.parse_errors.iter().any(|e| e.contains(UNIT_MISSING)));
        assert_eq!(line.price_min, Some(dec("70000")));
        assert_eq!(line.price_avg, Some(dec("73833")));
        assert_eq!(line.price_max, Some(dec("84000")));
        assert!(line.designation.is_none());
    }

    #[test]
    fn unit_after_prices() {
        let line = parse("Sucre 600 650 700 kg");
        assert_eq!(line.status, ParseStatus::Ok);
        assert_eq!(line.designation.as_deref(), Some("Sucre"));
        assert_eq!(line.unit.as_deref(), Some("kg"));
    }

    #[test]
    fn raw_line_is_not_trimmed() {
        let text = "  Papier A4 Rame  500 600 700  ";
        let line = parse(text);
        assert_eq!(line.raw_line, text);
        assert_eq!(line.designation.as_deref(), Some("Papier A4"));
        assert_eq!(line.unit.as_deref(), Some("Rame"));
    }

    #[test]
    fn decorative_is_unparseable() {
        let line = parse("|||");
        assert_eq!(line.status, ParseStatus::Unparseable);
        assert_eq!(line.parse_errors, vec![DECORATIVE_LINE.to_string()]);

        assert_eq!(parse("------------").status, ParseStatus::Unparseable);
    }

    #[test]
    fn blank_is_empty_line() {
        let line = parse("   ");
        assert_eq!(line.status, ParseStatus::Unparseable);
        assert_eq!(line.parse_errors, vec![EMPTY_LINE.to_string()]);
        assert_eq!(line.raw_line, "   ");
    }

    #[test]
    fn incomplete_amounts_are_partial() {
        let line = parse("Riz brisure sac 25 000 27 500");
        assert_eq!(line.status, ParseStatus::Partial);
        assert_eq!(line.price_min, Some(dec("25000")));
        assert_eq!(line.price_avg, Some(dec("27500")));
        assert!(line.price_max.is_none());
        assert!(line.parse_errors[0].starts_with("found 2 price(s) but expected 3"));
        assert_eq!(line.designation.as_deref(), Some("Riz brisure sac 25 000 27 500"));
    }

    #[test]
    fn no_amounts_is_designation_only() {
        let line = parse("Abonnement au journal ESSOR");
        assert_eq!(line.status, ParseStatus::Partial);
        assert_eq!(line.designation.as_deref(), Some("Abonnement au journal ESSOR"));
        assert_eq!(line.parse_errors, vec![NO_PRICES_FOUND.to_string()]);
    }

    #[test]
    fn non_ascii_digits_abort_the_group() {
        // Arabic-Indic digits match \d but are not decimal literals
        let line = parse("Huile Litre ١٢٣ ٤٥٦ ٧٨٩");
        assert_eq!(line.status, ParseStatus::Unparseable);
        assert!(line.parse_errors[0].starts_with("price parse error"));
        assert!(line.price_min.is_none());
    }

    #[test]
    fn grouping_merges_text_ahead_of_prices() {
        let lines = [
            "Abonnement au journal ESSOR",
            "Abonnement annuel",
            "Abonnement annuel 70 000 73 833 84 000",
        ];
        let groups = group_lines(&lines);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].raw_line(),
            "Abonnement au journal ESSOR | Abonnement annuel | Abonnement annuel 70 000 73 833 84 000"
        );
    }

    #[test]
    fn ungrouped_price_line_closes_the_group() {
        let lines = ["Huile d'arachide", "raffinee Litre 1500 1750 2000", "Sucre kg 600 650 7000"];
        let groups = group_lines(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].raw_line(), "Huile d'arachide | raffinee Litre 1500 1750 2000");
        assert_eq!(groups[1].raw_line(), "Sucre kg 600 650 7000");
    }

    #[test]
    fn grouping_never_crosses_blank_lines() {
        let lines = ["Abonnement", "", "Annuel 70 000 73 833 84 000"];
        let groups = group_lines(&lines);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1], LineGroup::Empty { raw: String::new() });
        assert_eq!(groups[0].raw_line(), "Abonnement");
    }

    #[test]
    fn decorative_line_flushes_pending_text() {
        let lines = ["Gomme blanche", "====", "Crayon HB Piece 100 150 200"];
        let groups = group_lines(&lines);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].raw_line(), "====");
    }

    #[test]
    fn one_output_per_line_without_accumulation() {
        let lines = ["Crayon HB Piece 100 150 200", "   ", "|||", "Gomme Piece 50 75 100"];
        let parsed = LineParser::<TrailingTokenPolicy>::default().parse_lines(&lines);
        assert_eq!(parsed.len(), 4);
        for (line, raw) in parsed.iter().zip(lines) {
            assert_eq!(line.raw_line, raw);
        }
        assert_eq!(parsed[1].parse_errors, vec![EMPTY_LINE.to_string()]);
    }
}
