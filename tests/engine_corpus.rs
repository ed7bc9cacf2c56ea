// tests/engine_corpus.rs
//
// Corpus-level orchestration against an in-process mock of the statistics API.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use collocation_sentiment::config::WindowConfig;
use collocation_sentiment::corpus::CorpusTable;
use collocation_sentiment::engine::yearly_totals;
use collocation_sentiment::error::{Result, SentimentError};
use collocation_sentiment::lexicon::LexiconPair;
use collocation_sentiment::stats::{CollocationRequest, FrequencyRow, TextStatsService};
use collocation_sentiment::Scorer;

#[derive(Default)]
struct MockStats {
    collocations: HashMap<(String, String), Vec<(String, u64)>>,
    failing_urns: HashSet<String>,
    frequencies_fail: bool,
    calls: AtomicUsize,
}

impl MockStats {
    fn with(mut self, urn: &str, word: &str, rows: &[(&str, u64)]) -> Self {
        self.collocations.insert(
            (urn.to_string(), word.to_string()),
            rows.iter().map(|(t, c)| (t.to_string(), *c)).collect(),
        );
        self
    }

    fn failing(mut self, urn: &str) -> Self {
        self.failing_urns.insert(urn.to_string());
        self
    }
}

#[async_trait]
impl TextStatsService for MockStats {
    async fn collocations(&self, req: &CollocationRequest) -> Result<Vec<(String, u64)>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_urns.contains(&req.urn) {
            return Err(SentimentError::unavailable("collocations", "connection reset"));
        }
        Ok(self
            .collocations
            .get(&(req.urn.clone(), req.word.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn word_frequencies(&self, urns: &[String], words: &[String]) -> Result<Vec<FrequencyRow>> {
        if self.frequencies_fail {
            return Err(SentimentError::decode("word frequencies", "bad json"));
        }
        let mut out = Vec::new();
        for u in urns {
            for w in words {
                if let Some(rows) = self.collocations.get(&(u.clone(), w.clone())) {
                    out.push(FrequencyRow {
                        urn: u.clone(),
                        word: w.clone(),
                        count: rows.len() as u64,
                    });
                }
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn lexicons() -> Arc<LexiconPair> {
    Arc::new(LexiconPair::from_terms(["bra", "god"], ["dårlig", "vond"]))
}

fn corpus(text: &str) -> CorpusTable {
    CorpusTable::from_delimited(text).expect("corpus")
}

#[tokio::test]
async fn scores_and_merges_every_document() {
    let stats = Arc::new(
        MockStats::default()
            .with("A", "sol", &[("bra", 3), ("Bra", 2), ("dårlig", 1), ("123", 9)])
            .with("C", "sol", &[("vond", 4), ("god", 1)]),
    );
    let scorer = Scorer::new(stats.clone(), lexicons());
    let c = corpus("urn,title,author,year\nA,Avis A,,1990\nB,Avis B,,1990\nC,Avis C,,1991\n");

    let run = scorer
        .score_corpus(&c, &["sol".to_string()], WindowConfig::default())
        .await
        .unwrap();

    assert_eq!(
        run.table.columns(),
        &[
            "urn",
            "title",
            "year",
            "target_word",
            "frequency",
            "positive",
            "negative",
            "sentimentscore"
        ]
    );
    assert_eq!(run.table.len(), 3);
    assert_eq!(run.table.cell(0, "sentimentscore"), Some("4"));
    assert_eq!(run.table.cell(0, "frequency"), Some("4"));
    // B has no collocations: a successful empty lookup, not a failure.
    assert_eq!(run.table.cell(1, "sentimentscore"), Some("0"));
    assert_eq!(run.table.cell(2, "sentimentscore"), Some("-3"));

    assert_eq!(run.summary.failed_pairs, 0);
    assert_eq!(run.summary.pairs_scored, 3);
    assert_eq!(stats.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failed_lookup_scores_zero_and_is_counted() {
    let stats = Arc::new(
        MockStats::default()
            .with("A", "sol", &[("bra", 2)])
            .failing("B"),
    );
    let scorer = Scorer::new(stats, lexicons());
    let c = corpus("urn,year\nA,1990\nB,1991\n");

    let run = scorer
        .score_corpus(&c, &["sol".to_string()], WindowConfig::default())
        .await
        .unwrap();

    assert_eq!(run.table.len(), 2);
    assert_eq!(run.table.cell(1, "positive"), Some("0"));
    assert_eq!(run.summary.failed_pairs, 1);
    assert_eq!(run.failures[0].urn, "B");
    assert!(run.failures[0].error.contains("connection reset"));
}

#[tokio::test]
async fn one_call_per_distinct_document_and_keyword() {
    let stats = Arc::new(MockStats::default().with("A", "regn", &[("vond", 1)]));
    let scorer = Scorer::new(stats.clone(), lexicons());
    // A appears twice; the empty urn row cannot be scored and is dropped.
    let c = corpus("urn,year\nA,1990\nA,1990\n,1991\n");

    let run = scorer
        .score_corpus(&c, &["sol".to_string(), "regn".to_string()], WindowConfig::default())
        .await
        .unwrap();

    assert_eq!(stats.calls.load(Ordering::SeqCst), 2);
    assert_eq!(run.summary.unique_documents, 1);
    assert_eq!(run.summary.documents_dropped, 1);
    // two corpus rows × two keywords
    assert_eq!(run.table.len(), 4);
    let words: Vec<_> = (0..4).map(|i| run.table.cell(i, "target_word").unwrap()).collect();
    assert_eq!(words, vec!["sol", "regn", "sol", "regn"]);
}

#[tokio::test]
async fn frequency_failure_is_not_fatal() {
    let mut stats = MockStats::default().with("A", "sol", &[("bra", 1)]);
    stats.frequencies_fail = true;
    let scorer = Scorer::new(Arc::new(stats), lexicons());

    let run = scorer
        .score_corpus(&corpus("urn\nA\n"), &["sol".to_string()], WindowConfig::default())
        .await
        .unwrap();
    assert!(run.summary.frequency_lookup_failed);
    assert_eq!(run.table.cell(0, "frequency"), Some("0"));
    assert_eq!(run.table.cell(0, "positive"), Some("1"));
}

#[tokio::test]
async fn malformed_input_aborts_before_remote_calls() {
    let stats = Arc::new(MockStats::default());
    let scorer = Scorer::new(stats.clone(), lexicons());

    let err = scorer
        .score_corpus(&corpus("id,year\nA,1990\n"), &["sol".to_string()], WindowConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "malformed_input");

    let err = scorer
        .score_corpus(&corpus("urn\nA\n"), &[], WindowConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "malformed_input");
    assert_eq!(stats.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn inspect_surfaces_failures() {
    let stats = Arc::new(
        MockStats::default()
            .with("A", "sol", &[("bra", 1), ("hus", 2)])
            .failing("B"),
    );
    let scorer = Scorer::new(stats, lexicons());

    let terms = scorer
        .inspect(&CollocationRequest::new("A", "sol", 5, 5))
        .await
        .unwrap();
    assert_eq!(terms.len(), 2);

    let err = scorer
        .inspect(&CollocationRequest::new("B", "sol", 5, 5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "data_unavailable");
}

#[tokio::test]
async fn rescoring_an_export_replaces_old_score_columns() {
    let stats = Arc::new(MockStats::default().with("A", "sol", &[("bra", 5)]));
    let scorer = Scorer::new(stats, lexicons());
    let exported = corpus("urn,year,positive,negative,sentimentscore\nA,1990,0,9,-9\n");

    let run = scorer
        .score_corpus(&exported, &["sol".to_string()], WindowConfig::default())
        .await
        .unwrap();

    assert_eq!(
        run.table.columns(),
        &[
            "urn",
            "year",
            "target_word",
            "frequency",
            "positive",
            "negative",
            "sentimentscore"
        ]
    );
    assert_eq!(run.table.cell(0, "positive"), Some("5"));
    assert_eq!(run.table.cell(0, "negative"), Some("0"));
    assert_eq!(run.table.cell(0, "sentimentscore"), Some("5"));

    let totals = yearly_totals(&run.table);
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].positive, 5);
    assert_eq!(totals[0].negative, 0);
    assert_eq!(totals[0].sentimentscore, 5);
}

#[tokio::test]
async fn blank_keywords_are_skipped() {
    let stats = Arc::new(MockStats::default().with("A", "sol", &[("bra", 1)]));
    let scorer = Scorer::new(stats.clone(), lexicons());

    let run = scorer
        .score_corpus(
            &corpus("urn\nA\n"),
            &["sol".to_string(), "  ".to_string(), String::new()],
            WindowConfig::default(),
        )
        .await
        .unwrap();

    assert_eq!(stats.calls.load(Ordering::SeqCst), 1);
    assert_eq!(run.table.len(), 1);
    assert_eq!(run.summary.pairs_scored, 1);
    assert_eq!(run.table.cell(0, "target_word"), Some("sol"));
}
