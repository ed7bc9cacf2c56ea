//! HTTP surface for the dashboard front-end.
//!
//! - `GET  /health`
//! - `POST /score?keyword=..&before=..&after=..&format=json|csv` (body: corpus CSV/TSV)
//! - `GET  /inspect?urn=..&keyword=..&before=..&after=..` (labeled terms for one document)
//! - `GET  /lexicon`

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::cache::{CacheKey, ResultCache};
use crate::config::WindowConfig;
use crate::corpus::{parse_keywords, CorpusTable};
use crate::engine::{yearly_totals, PairFailure, RunSummary, ScoreRun, Scorer, YearTotal};
use crate::error::SentimentError;
use crate::sentiment::{counts_from_partition, LabeledTerm, SentimentCounts};
use crate::stats::CollocationRequest;

pub const CACHE_HEADER: &str = "x-result-cache";

#[derive(Clone)]
pub struct AppState {
    pub scorer: Scorer,
    pub cache: Arc<ResultCache>,
    /// Window used when a request does not specify one.
    pub window: WindowConfig,
}

impl AppState {
    pub fn new(scorer: Scorer, window: WindowConfig, cache_capacity: usize) -> Self {
        Self {
            scorer,
            cache: Arc::new(ResultCache::with_capacity(cache_capacity)),
            window,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/score", post(score))
        .route("/inspect", get(inspect))
        .route("/lexicon", get(lexicon_info))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `SentimentError` as an HTTP response.
pub struct ApiError(SentimentError);

impl From<SentimentError> for ApiError {
    fn from(e: SentimentError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            SentimentError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            SentimentError::DataUnavailable { .. } | SentimentError::Decode { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Deserialize)]
struct ScoreQuery {
    keyword: String,
    before: Option<usize>,
    after: Option<usize>,
    #[serde(default)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct ScoreResponse<'a> {
    columns: &'a [String],
    rows: &'a [Vec<String>],
    summary: &'a RunSummary,
    failures: &'a [PairFailure],
    yearly: Vec<YearTotal>,
}

fn window_from(default: WindowConfig, before: Option<usize>, after: Option<usize>) -> WindowConfig {
    WindowConfig {
        before: before.unwrap_or(default.before),
        after: after.unwrap_or(default.after),
    }
}

async fn score(
    State(state): State<AppState>,
    Query(q): Query<ScoreQuery>,
    body: String,
) -> Result<Response, ApiError> {
    let keywords = parse_keywords(&q.keyword)?;
    let window = window_from(state.window, q.before, q.after);
    let key = CacheKey::new(&body, &keywords, window);

    let (run, hit): (Arc<ScoreRun>, bool) = match state.cache.get(key) {
        Some(run) => {
            counter!("sentiment_result_cache_hits_total").increment(1);
            (run, true)
        }
        None => {
            let corpus = CorpusTable::from_delimited(&body)?;
            let run = Arc::new(state.scorer.score_corpus(&corpus, &keywords, window).await?);
            // Degraded runs are not replayed; the next request retries the lookups.
            if run.summary.is_complete() {
                state.cache.put(key, run.clone());
            }
            (run, false)
        }
    };
    info!(%key, hit, rows = run.table.len(), "score request served");

    let cache_value = if hit { "HIT" } else { "MISS" };
    let resp = match q.format {
        OutputFormat::Csv => {
            let csv = run.table.to_csv()?;
            (
                [
                    ("content-type", "text/csv; charset=utf-8"),
                    (CACHE_HEADER, cache_value),
                ],
                csv,
            )
                .into_response()
        }
        OutputFormat::Json => {
            let body = ScoreResponse {
                columns: run.table.columns(),
                rows: run.table.rows(),
                summary: &run.summary,
                failures: &run.failures,
                yearly: yearly_totals(&run.table),
            };
            ([(CACHE_HEADER, cache_value)], Json(body)).into_response()
        }
    };
    Ok(resp)
}

#[derive(Deserialize)]
struct InspectQuery {
    urn: String,
    keyword: String,
    before: Option<usize>,
    after: Option<usize>,
}

#[derive(Serialize)]
struct InspectResponse {
    urn: String,
    keyword: String,
    counts: SentimentCounts,
    sentimentscore: i64,
    terms: Vec<LabeledTerm>,
}

async fn inspect(
    State(state): State<AppState>,
    Query(q): Query<InspectQuery>,
) -> Result<Json<InspectResponse>, ApiError> {
    let keyword = q.keyword.trim();
    if q.urn.trim().is_empty() || keyword.is_empty() {
        return Err(SentimentError::malformed("urn and keyword are required").into());
    }
    let window = window_from(state.window, q.before, q.after);
    let req = CollocationRequest::new(q.urn.trim(), keyword, window.before, window.after);
    let terms = state.scorer.inspect(&req).await?;
    let counts = counts_from_partition(&terms);
    Ok(Json(InspectResponse {
        urn: req.urn,
        keyword: req.word,
        counts,
        sentimentscore: counts.score(),
        terms,
    }))
}

#[derive(Serialize)]
struct LexiconSide {
    terms: usize,
    source: String,
}

#[derive(Serialize)]
struct LexiconInfo {
    positive: LexiconSide,
    negative: LexiconSide,
    service: &'static str,
}

async fn lexicon_info(State(state): State<AppState>) -> Json<LexiconInfo> {
    let lex = state.scorer.lexicons();
    Json(LexiconInfo {
        positive: LexiconSide {
            terms: lex.positive.len(),
            source: lex.positive.source().to_string(),
        },
        negative: LexiconSide {
            terms: lex.negative.len(),
            source: lex.negative.source().to_string(),
        },
        service: state.scorer.service_name(),
    })
}
