//! # Corpus scoring engine
//! Runs the per-document pipeline over a corpus and merges the scores back.
//!
//! For every distinct document and every keyword: fetch + normalize
//! collocations, score them (score-only mode), and emit one score row.
//! Documents are processed one after another; a failed collocation lookup
//! scores that pair as zero and is counted in the `RunSummary`, while
//! malformed input aborts the run before any remote call.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collocation::{fetch_collocations, CollocationFetch};
use crate::config::WindowConfig;
use crate::corpus::{CorpusTable, URN_COLUMN};
use crate::error::{Result, SentimentError};
use crate::lexicon::LexiconPair;
use crate::metrics::ensure_metrics_described;
use crate::sentiment::{partition, score_counts, LabeledTerm, SentimentCounts};
use crate::stats::{CollocationRequest, TextStatsService};

/// Score columns appended to the corpus, in output order.
pub const SCORE_COLUMNS: [&str; 5] = [
    "target_word",
    "frequency",
    "positive",
    "negative",
    "sentimentscore",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRow {
    pub urn: String,
    pub target_word: String,
    pub frequency: u64,
    pub positive: u64,
    pub negative: u64,
    pub sentimentscore: i64,
}

impl ScoreRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.urn.clone(),
            self.target_word.clone(),
            self.frequency.to_string(),
            self.positive.to_string(),
            self.negative.to_string(),
            self.sentimentscore.to_string(),
        ]
    }
}

/// A (document, keyword) pair whose collocations could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairFailure {
    pub urn: String,
    pub word: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Corpus rows on input.
    pub documents: usize,
    /// Distinct document ids that were scored.
    pub unique_documents: usize,
    pub pairs_scored: usize,
    /// Pairs scored as zero because the collocation lookup failed.
    pub failed_pairs: usize,
    /// Corpus rows absent from the result (no score row to join with).
    pub documents_dropped: usize,
    /// The frequency lookup failed; every `frequency` cell is 0.
    pub frequency_lookup_failed: bool,
    pub elapsed_ms: u64,
    /// RFC 3339, UTC.
    pub finished_at: String,
}

impl RunSummary {
    /// Every collocation lookup and the frequency lookup succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed_pairs == 0 && !self.frequency_lookup_failed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreRun {
    /// Corpus joined with the score rows, all-empty metadata columns removed.
    pub table: CorpusTable,
    pub rows: Vec<ScoreRow>,
    pub summary: RunSummary,
    pub failures: Vec<PairFailure>,
}

/// Score for one (document, keyword) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentScore {
    pub counts: SentimentCounts,
    pub failure: Option<SentimentError>,
}

/// Per-year sums of the score columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTotal {
    pub year: String,
    pub positive: i64,
    pub negative: i64,
    pub sentimentscore: i64,
}

/// Stateless scorer: the remote service plus the loaded lexicons.
#[derive(Clone)]
pub struct Scorer {
    service: Arc<dyn TextStatsService>,
    lexicons: Arc<LexiconPair>,
}

impl Scorer {
    pub fn new(service: Arc<dyn TextStatsService>, lexicons: Arc<LexiconPair>) -> Self {
        Self { service, lexicons }
    }

    pub fn lexicons(&self) -> &LexiconPair {
        &self.lexicons
    }

    pub fn service_name(&self) -> &'static str {
        self.service.name()
    }

    /// Hot path: fetch, normalize, sum. Never fails; see `DocumentScore::failure`.
    pub async fn score_document(&self, req: &CollocationRequest) -> DocumentScore {
        let CollocationFetch { table, failure } = fetch_collocations(self.service.as_ref(), req).await;
        DocumentScore {
            counts: score_counts(&table, &self.lexicons),
            failure,
        }
    }

    /// Full labeled partition for one pair. Unlike `score_document`, a failed
    /// lookup is returned as an error: an empty inspection result would be
    /// indistinguishable from a document without collocations.
    pub async fn inspect(&self, req: &CollocationRequest) -> Result<Vec<LabeledTerm>> {
        let fetched = fetch_collocations(self.service.as_ref(), req).await;
        if let Some(e) = fetched.failure {
            return Err(e);
        }
        Ok(partition(&fetched.table, &self.lexicons))
    }

    /// Score every document × keyword and merge the rows into the corpus.
    pub async fn score_corpus(
        &self,
        corpus: &CorpusTable,
        keywords: &[String],
        window: WindowConfig,
    ) -> Result<ScoreRun> {
        ensure_metrics_described();
        let t0 = Instant::now();

        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if keywords.is_empty() {
            return Err(SentimentError::malformed("no keyword given"));
        }
        let urns = distinct(corpus.urns()?);

        info!(
            documents = corpus.len(),
            unique = urns.len(),
            keywords = ?keywords,
            before = window.before,
            after = window.after,
            service = self.service.name(),
            "scoring corpus"
        );

        let (frequencies, frequency_lookup_failed) = self.frequencies(&urns, &keywords).await;

        let mut rows = Vec::with_capacity(urns.len() * keywords.len());
        let mut failures = Vec::new();
        for urn in &urns {
            for word in &keywords {
                let req = CollocationRequest::new(urn.as_str(), word.as_str(), window.before, window.after);
                let DocumentScore { counts, failure } = self.score_document(&req).await;
                if let Some(e) = failure {
                    failures.push(PairFailure {
                        urn: urn.clone(),
                        word: word.clone(),
                        error: e.to_string(),
                    });
                }
                let frequency = frequencies
                    .get(&(urn.clone(), word.to_lowercase()))
                    .copied()
                    .unwrap_or(0);
                debug!(%urn, %word, frequency, positive = counts.positive, negative = counts.negative, "pair scored");
                rows.push(ScoreRow {
                    urn: urn.clone(),
                    target_word: word.clone(),
                    frequency,
                    positive: counts.positive,
                    negative: counts.negative,
                    sentimentscore: counts.score(),
                });
            }
        }
        counter!("sentiment_pairs_scored_total").increment(rows.len() as u64);

        let table = merge_scores(corpus, &rows)?;

        let scored: HashSet<&str> = rows.iter().map(|r| r.urn.as_str()).collect();
        let urn_idx = corpus.require_column(URN_COLUMN)?;
        let documents_dropped = corpus
            .rows()
            .iter()
            .filter(|r| !scored.contains(r[urn_idx].as_str()))
            .count();
        counter!("sentiment_documents_dropped_total").increment(documents_dropped as u64);

        let elapsed_ms = t0.elapsed().as_millis() as u64;
        histogram!("sentiment_run_ms").record(elapsed_ms as f64);

        let summary = RunSummary {
            documents: corpus.len(),
            unique_documents: urns.len(),
            pairs_scored: rows.len(),
            failed_pairs: failures.len(),
            documents_dropped,
            frequency_lookup_failed,
            elapsed_ms,
            finished_at: chrono::Utc::now().to_rfc3339(),
        };
        if summary.failed_pairs > 0 {
            warn!(
                failed = summary.failed_pairs,
                pairs = summary.pairs_scored,
                "some documents were scored as zero after failed collocation lookups"
            );
        }
        info!(
            pairs = summary.pairs_scored,
            dropped = summary.documents_dropped,
            elapsed_ms,
            "corpus scored"
        );

        Ok(ScoreRun {
            table,
            rows,
            summary,
            failures,
        })
    }

    /// One frequency lookup for the whole corpus. A failure is not fatal.
    async fn frequencies(&self, urns: &[String], keywords: &[String]) -> (HashMap<(String, String), u64>, bool) {
        match self.service.word_frequencies(urns, keywords).await {
            Ok(found) => {
                let map = found
                    .into_iter()
                    .map(|f| ((f.urn, f.word.to_lowercase()), f.count))
                    .collect();
                (map, false)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "word frequency lookup failed, using 0");
                (HashMap::new(), true)
            }
        }
    }
}

fn distinct(urns: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urns.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// Inner-join the score rows on `urn`, then drop metadata columns that are
/// empty in every surviving row. Score columns already present in the corpus
/// (a re-uploaded export) are replaced by the fresh ones.
pub fn merge_scores(corpus: &CorpusTable, rows: &[ScoreRow]) -> Result<CorpusTable> {
    let mut columns = vec![URN_COLUMN.to_string()];
    columns.extend(SCORE_COLUMNS.iter().map(|c| c.to_string()));
    let scores = CorpusTable::new(columns, rows.iter().map(ScoreRow::cells).collect())?;

    let mut keep = vec![URN_COLUMN];
    keep.extend(SCORE_COLUMNS);
    Ok(corpus
        .without_columns(&SCORE_COLUMNS)
        .inner_join(&scores, URN_COLUMN)?
        .strip_empty_columns(&keep))
}

/// Sum the score columns per `year`, in ascending year order. Tables without a
/// `year` column yield nothing; rows with an empty year are skipped.
pub fn yearly_totals(table: &CorpusTable) -> Vec<YearTotal> {
    let (Some(y), Some(p), Some(n), Some(s)) = (
        table.column_index("year"),
        table.column_index("positive"),
        table.column_index("negative"),
        table.column_index("sentimentscore"),
    ) else {
        return Vec::new();
    };

    let num = |v: &str| v.trim().parse::<i64>().unwrap_or(0);
    let mut acc: BTreeMap<String, (i64, i64, i64)> = BTreeMap::new();
    for row in table.rows() {
        let year = row[y].trim();
        if year.is_empty() {
            continue;
        }
        let e = acc.entry(year.to_string()).or_default();
        e.0 += num(&row[p]);
        e.1 += num(&row[n]);
        e.2 += num(&row[s]);
    }
    acc.into_iter()
        .map(|(year, (positive, negative, sentimentscore))| YearTotal {
            year,
            positive,
            negative,
            sentimentscore,
        })
        .collect()
}
