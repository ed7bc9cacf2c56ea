//! # Sentiment aggregation
//! Combines a normalized collocation table with the two lexicons.
//!
//! Every collocation term lands in exactly one class:
//! - `pos`     : in the positive lexicon
//! - `neg`     : in the negative lexicon and not in the positive one
//! - `neutral` : in neither
//!
//! Positive wins when a term is listed in both lexicons, so score-only sums and
//! the labeled partition always agree.

use serde::Serialize;

use crate::collocation::CollocationTable;
use crate::lexicon::LexiconPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Pos,
    Neg,
    Neutral,
}

impl SentimentClass {
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentClass::Pos => "pos",
            SentimentClass::Neg => "neg",
            SentimentClass::Neutral => "neutral",
        }
    }
}

/// Class of a single (already normalized) term.
#[inline]
pub fn classify(term: &str, lexicons: &LexiconPair) -> SentimentClass {
    if lexicons.positive.contains(term) {
        SentimentClass::Pos
    } else if lexicons.negative.contains(term) {
        SentimentClass::Neg
    } else {
        SentimentClass::Neutral
    }
}

/// Summed counts of positive and negative context terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: u64,
    pub negative: u64,
}

impl SentimentCounts {
    /// positive − negative.
    pub fn score(&self) -> i64 {
        self.positive as i64 - self.negative as i64
    }
}

/// Score-only mode: one pass, no partition tables.
pub fn score_counts(table: &CollocationTable, lexicons: &LexiconPair) -> SentimentCounts {
    let mut out = SentimentCounts::default();
    for (term, count) in table.iter() {
        match classify(term, lexicons) {
            SentimentClass::Pos => out.positive += count,
            SentimentClass::Neg => out.negative += count,
            SentimentClass::Neutral => {}
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledTerm {
    pub term: String,
    pub counts: u64,
    pub sentiment: SentimentClass,
}

/// Full mode: every term with its class, positive block first, then negative,
/// then neutral; alphabetical inside each block. Meant for inspection.
pub fn partition(table: &CollocationTable, lexicons: &LexiconPair) -> Vec<LabeledTerm> {
    let mut out: Vec<LabeledTerm> = table
        .iter()
        .map(|(term, counts)| LabeledTerm {
            term: term.to_string(),
            counts,
            sentiment: classify(term, lexicons),
        })
        .collect();
    // stable: table iteration is already alphabetical
    out.sort_by_key(|t| t.sentiment);
    out
}

/// Sums per class over a labeled partition.
pub fn counts_from_partition(terms: &[LabeledTerm]) -> SentimentCounts {
    terms
        .iter()
        .fold(SentimentCounts::default(), |mut acc, t| {
            match t.sentiment {
                SentimentClass::Pos => acc.positive += t.counts,
                SentimentClass::Neg => acc.negative += t.counts,
                SentimentClass::Neutral => {}
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collocation::normalize_collocations;

    fn lex() -> LexiconPair {
        LexiconPair::from_terms(["bra", "god"], ["dårlig", "vond"])
    }

    #[test]
    fn concrete_scenario_scores_four() {
        let table = normalize_collocations(vec![
            ("bra", 3),
            ("Bra", 2),
            ("dårlig", 1),
            ("123", 9),
            ("!!", 4),
        ]);
        let lexicons = LexiconPair::from_terms(["bra"], ["dårlig"]);
        let c = score_counts(&table, &lexicons);
        assert_eq!((c.positive, c.negative), (5, 1));
        assert_eq!(c.score(), 4);
    }

    #[test]
    fn partition_orders_blocks() {
        let table = normalize_collocations(vec![("vond", 1), ("hus", 2), ("god", 3), ("bra", 1)]);
        let p = partition(&table, &lex());
        let labels: Vec<_> = p.iter().map(|t| (t.term.as_str(), t.sentiment)).collect();
        assert_eq!(
            labels,
            vec![
                ("bra", SentimentClass::Pos),
                ("god", SentimentClass::Pos),
                ("vond", SentimentClass::Neg),
                ("hus", SentimentClass::Neutral),
            ]
        );
    }

    #[test]
    fn empty_table_scores_zero() {
        let table = CollocationTable::new();
        assert_eq!(score_counts(&table, &lex()), SentimentCounts::default());
        assert!(partition(&table, &lex()).is_empty());
    }

    #[test]
    fn shared_term_counts_as_positive() {
        let lexicons = LexiconPair::from_terms(["grei"], ["grei", "dårlig"]);
        let table = normalize_collocations(vec![("grei", 2), ("dårlig", 1)]);
        let c = score_counts(&table, &lexicons);
        assert_eq!((c.positive, c.negative), (2, 1));
        assert_eq!(counts_from_partition(&partition(&table, &lexicons)), c);
    }

    #[test]
    fn negative_score_is_signed() {
        let table = normalize_collocations(vec![("vond", 7), ("bra", 2)]);
        assert_eq!(score_counts(&table, &lex()).score(), -5);
    }
}
