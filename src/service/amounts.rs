//! Price amount scanning.
//!
//! An amount is a run of digit tokens joined by single thousands separators
//! (space, nbsp, apostrophe) with an optional `,`/`.` decimal tail:
//! "73 833", "1 250,50", "84000", "85'000".
//!
//! A single space is ambiguous between a thousands separator and the gap
//! between two amounts. Runs are read greedily: a token of exactly three
//! integer digits after a single separator continues the amount before it.
//! So "25 000 27 500" is two amounts, and "200 300" on its own is the one
//! amount 200300. The exception is a run of exactly three
//! whitespace-separated tokens, which is always three amounts
//! ("100 150 200", "100 200 3000", "2 500 3000").

use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+(?:[.,]\d{1,4})?\b").unwrap());

static THOUSANDS_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\u{00a0}']").unwrap());

/// Byte range of one amount in the scanned text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountSpan {
    pub start: usize,
    pub end: usize,
}

impl AmountSpan {
    pub fn as_str<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// Amounts found in one text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedAmounts {
    /// Every amount, greedy reading, left to right
    pub amounts: Vec<AmountSpan>,
    /// First three consecutive amounts of one run, if any
    pub triple: Option<[AmountSpan; 3]>,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
    int_digits: usize,
    decimal: bool,
    zero_led: bool,
}

impl Token {
    fn new(m: regex::Match<'_>) -> Self {
        let text = m.as_str();
        let int_part = text.split(|c: char| c == '.' || c == ',').next().unwrap_or(text);
        let int_digits = int_part.chars().count();
        Self {
            start: m.start(),
            end: m.end(),
            int_digits,
            decimal: int_part.len() < text.len(),
            zero_led: int_part.starts_with('0') && int_digits > 1,
        }
    }

    fn is_group(&self) -> bool {
        self.int_digits == 3
    }

    fn leads_groups(&self) -> bool {
        !self.decimal && !self.zero_led && self.int_digits <= 3
    }

    fn span(&self) -> AmountSpan {
        AmountSpan {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gap {
    /// single apostrophe
    Join,
    /// single space or nbsp
    JoinOrSplit,
    /// longer whitespace
    Split,
    /// anything else ends the run
    Break,
}

impl Gap {
    fn between(text: &str, prev: &Token, next: &Token) -> Self {
        let gap = &text[prev.end..next.start];
        let mut chars = gap.chars();
        match (chars.next(), chars.next()) {
            (Some('\''), None) => Gap::Join,
            (Some(' ' | '\u{00a0}'), None) => Gap::JoinOrSplit,
            (Some(_), _) if gap.chars().all(char::is_whitespace) => Gap::Split,
            _ => Gap::Break,
        }
    }

    fn joins(self) -> bool {
        matches!(self, Gap::Join | Gap::JoinOrSplit)
    }

    fn splits(self) -> bool {
        matches!(self, Gap::JoinOrSplit | Gap::Split)
    }
}

/// One run of tokens; `gaps[k]` sits between `tokens[k]` and `tokens[k + 1]`.
struct Run {
    tokens: Vec<Token>,
    gaps: Vec<Gap>,
}

impl Run {
    fn greedy(&self) -> Vec<AmountSpan> {
        let mut spans = Vec::new();
        let mut i = 0;
        while i < self.tokens.len() {
            let mut j = i;
            if self.tokens[i].leads_groups() {
                while j + 1 < self.tokens.len()
                    && !self.tokens[j].decimal
                    && self.gaps[j].joins()
                    && self.tokens[j + 1].is_group()
                {
                    j += 1;
                }
            }
            spans.push(AmountSpan {
                start: self.tokens[i].start,
                end: self.tokens[j].end,
            });
            i = j + 1;
        }
        spans
    }

    fn three_tokens(&self) -> Option<[AmountSpan; 3]> {
        match self.tokens.as_slice() {
            [a, b, c] if self.gaps.iter().all(|g| g.splits()) && !self.tokens.iter().any(|t| t.zero_led) => {
                Some([a.span(), b.span(), c.span()])
            }
            _ => None,
        }
    }
}

fn runs(text: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<Run> = None;

    for token in NUMBER.find_iter(text).map(Token::new) {
        current = Some(match current.take() {
            Some(mut run) => {
                let gap = run
                    .tokens
                    .last()
                    .map(|prev| Gap::between(text, prev, &token))
                    .unwrap_or(Gap::Break);
                if gap == Gap::Break {
                    runs.push(run);
                    Run {
                        tokens: vec![token],
                        gaps: Vec::new(),
                    }
                } else {
                    run.tokens.push(token);
                    run.gaps.push(gap);
                    run
                }
            }
            None => Run {
                tokens: vec![token],
                gaps: Vec::new(),
            },
        });
    }
    runs.extend(current);
    runs
}

/// Scan `text` for amounts and the first min/avg/max triple.
pub fn scan(text: &str) -> ScannedAmounts {
    let mut scanned = ScannedAmounts::default();

    for run in runs(text) {
        let greedy = run.greedy();
        if scanned.triple.is_none() {
            scanned.triple = match greedy.as_slice() {
                [a, b, c, ..] => Some([*a, *b, *c]),
                _ => run.three_tokens(),
            };
        }
        scanned.amounts.extend(greedy);
    }
    scanned
}

/// Decimal value of an amount: separators stripped, decimal comma to point.
pub fn parse_amount(raw: &str) -> Result<BigDecimal, bigdecimal::ParseBigDecimalError> {
    let cleaned = THOUSANDS_SEPARATOR.replace_all(raw, "").replace(',', ".");
    BigDecimal::from_str(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(text: &str) -> Vec<&str> {
        scan(text).amounts.iter().map(|s| s.as_str(text)).collect()
    }

    fn triple(text: &str) -> Option<[&str; 3]> {
        scan(text)
            .triple
            .map(|[a, b, c]| [a.as_str(text), b.as_str(text), c.as_str(text)])
    }

    #[test]
    fn grouped_amounts() {
        assert_eq!(
            triple("Agenda Unite 2 500 3 300 4 000"),
            Some(["2 500", "3 300", "4 000"])
        );
        assert_eq!(
            triple("1 250,50 1 300,00 1 400,00"),
            Some(["1 250,50", "1 300,00", "1 400,00"])
        );
        assert_eq!(triple("85'000 90'000 97'500"), Some(["85'000", "90'000", "97'500"]));
    }

    #[test]
    fn ungrouped_amounts() {
        assert_eq!(triple("Ciment Tonne 85000 90000 97500"), Some(["85000", "90000", "97500"]));
        assert_eq!(triple("Riz kg 1500 2000 2500"), Some(["1500", "2000", "2500"]));
    }

    #[test]
    fn three_tokens_are_three_amounts() {
        assert_eq!(triple("Riz kg 100 200 3000"), Some(["100", "200", "3000"]));
        assert_eq!(triple("Gomme 50 75 100"), Some(["50", "75", "100"]));
        assert_eq!(triple("2 500 3000"), Some(["2", "500", "3000"]));
    }

    #[test]
    fn two_grouped_amounts_are_not_a_triple() {
        let text = "Riz brisure sac 25 000 27 500";
        assert_eq!(triple(text), None);
        assert_eq!(amounts(text), vec!["25 000", "27 500"]);
    }

    #[test]
    fn a_single_space_between_separate_amounts_groups_them() {
        let text = "Riz 100 kg 200 300";
        assert_eq!(triple(text), None);
        assert_eq!(amounts(text), vec!["100", "200 300"]);
    }

    #[test]
    fn digits_glued_to_letters_are_not_amounts() {
        assert!(amounts("Papier A4 Ciment 50kg").is_empty());
    }

    #[test]
    fn amount_values() {
        assert_eq!(parse_amount("1 250,50").unwrap(), BigDecimal::from_str("1250.5").unwrap());
        assert_eq!(parse_amount("85'000").unwrap(), BigDecimal::from_str("85000").unwrap());
        assert_eq!(parse_amount("73\u{00a0}833").unwrap(), BigDecimal::from_str("73833").unwrap());
        assert!(parse_amount("١٢٣").is_err());
    }
}
