//! DH-lab API client (National Library text statistics).
//!
//! Endpoints used:
//! - `POST {base}/urncolldist_urn` → column-oriented JSON table with a `counts` column
//! - `POST {base}/frequencies`     → one list per document of `[urn, word, count, ...]` rows
//!
//! The collocation endpoint sometimes returns the table double-encoded as a
//! JSON string; both forms are accepted.

use anyhow::Context;
use async_trait::async_trait;
use metrics::histogram;
use serde::Serialize;
use serde_json::Value;

use super::{CollocationRequest, FrequencyRow, TextStatsService};
use crate::config::ServiceConfig;
use crate::error::{Result, SentimentError};

/// Build the shared HTTP client (also used for lexicon downloads).
pub fn http_client(cfg: &ServiceConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(cfg.user_agent.as_str())
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.timeout())
        .build()
        .context("building reqwest client")
}

pub struct DhlabClient {
    http: reqwest::Client,
    base_url: String,
    sample_size: u64,
    frequency_cutoff: u64,
}

impl DhlabClient {
    pub fn new(http: reqwest::Client, cfg: &ServiceConfig) -> Self {
        Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            sample_size: cfg.sample_size,
            frequency_cutoff: cfg.frequency_cutoff,
        }
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B, what: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path);
        let t0 = std::time::Instant::now();
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SentimentError::unavailable(what, e))?;
        let resp = resp
            .error_for_status()
            .map_err(|e| SentimentError::unavailable(what, e))?;
        let text = resp
            .text()
            .await
            .map_err(|e| SentimentError::unavailable(what, e))?;
        histogram!("sentiment_remote_call_ms", "endpoint" => path.to_string())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(text)
    }
}

#[derive(Serialize)]
struct CollocationBody<'a> {
    urn: [&'a str; 1],
    word: &'a str,
    before: usize,
    after: usize,
    samplesize: u64,
}

#[derive(Serialize)]
struct FrequencyBody<'a> {
    urns: &'a [String],
    cutoff: u64,
    words: &'a [String],
}

#[async_trait]
impl TextStatsService for DhlabClient {
    async fn collocations(&self, req: &CollocationRequest) -> Result<Vec<(String, u64)>> {
        let body = CollocationBody {
            urn: [req.urn.as_str()],
            word: &req.word,
            before: req.before,
            after: req.after,
            samplesize: self.sample_size,
        };
        let text = self.post_json("urncolldist_urn", &body, "collocations").await?;
        decode_collocations(&text)
    }

    async fn word_frequencies(&self, urns: &[String], words: &[String]) -> Result<Vec<FrequencyRow>> {
        if urns.is_empty() || words.is_empty() {
            return Ok(Vec::new());
        }
        let body = FrequencyBody {
            urns,
            cutoff: self.frequency_cutoff,
            words,
        };
        let text = self.post_json("frequencies", &body, "word frequencies").await?;
        decode_frequencies(&text)
    }

    fn name(&self) -> &'static str {
        "dhlab"
    }
}

fn unwrap_string_encoded(v: Value, what: &str) -> Result<Value> {
    match v {
        Value::String(inner) => {
            serde_json::from_str(&inner).map_err(|e| SentimentError::decode(what, e))
        }
        other => Ok(other),
    }
}

/// Counts arrive as JSON numbers, possibly floats (`3.0`) or `null` for missing cells.
fn count_of(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f.round() as u64)
}

/// Decode a collocation response into raw (term, count) pairs.
///
/// Accepted shapes: `{"counts": {term: n, ...}, ...}` (other columns ignored),
/// a list of records `[{"word": t, "counts": n}, ...]`, or `{}` / `[]` for no data.
pub fn decode_collocations(body: &str) -> Result<Vec<(String, u64)>> {
    const WHAT: &str = "collocations";
    let v: Value = serde_json::from_str(body).map_err(|e| SentimentError::decode(WHAT, e))?;
    let v = unwrap_string_encoded(v, WHAT)?;

    match v {
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        Value::Object(map) => {
            let counts = map
                .get("counts")
                .and_then(Value::as_object)
                .ok_or_else(|| SentimentError::decode(WHAT, "missing `counts` column"))?;
            Ok(counts
                .iter()
                .filter_map(|(term, n)| count_of(n).map(|c| (term.clone(), c)))
                .collect())
        }
        Value::Array(records) => {
            let mut out = Vec::with_capacity(records.len());
            for rec in &records {
                let term = rec
                    .get("word")
                    .or_else(|| rec.get("index"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| SentimentError::decode(WHAT, "record without a word"))?;
                if let Some(c) = rec.get("counts").and_then(count_of) {
                    out.push((term.to_string(), c));
                }
            }
            Ok(out)
        }
        other => Err(SentimentError::decode(
            WHAT,
            format!("unexpected JSON {}", type_name(&other)),
        )),
    }
}

/// Decode a frequency response: a list per document of `[urn, word, count, ...]` rows.
/// Empty per-document lists are skipped.
pub fn decode_frequencies(body: &str) -> Result<Vec<FrequencyRow>> {
    const WHAT: &str = "word frequencies";
    let v: Value = serde_json::from_str(body).map_err(|e| SentimentError::decode(WHAT, e))?;
    let v = unwrap_string_encoded(v, WHAT)?;

    let docs = v
        .as_array()
        .ok_or_else(|| SentimentError::decode(WHAT, format!("expected array, got {}", type_name(&v))))?;

    let mut out = Vec::new();
    for doc in docs {
        let rows = doc
            .as_array()
            .ok_or_else(|| SentimentError::decode(WHAT, "document entry is not a list"))?;
        for row in rows {
            let cells = row.as_array().filter(|c| c.len() >= 3).ok_or_else(|| {
                SentimentError::decode(WHAT, "row must be [urn, word, count, ...]")
            })?;
            let urn = cells[0]
                .as_str()
                .map(str::to_string)
                .or_else(|| cells[0].as_i64().map(|n| n.to_string()))
                .ok_or_else(|| SentimentError::decode(WHAT, "urn cell is not text"))?;
            let word = cells[1]
                .as_str()
                .ok_or_else(|| SentimentError::decode(WHAT, "word cell is not text"))?;
            let count = count_of(&cells[2])
                .ok_or_else(|| SentimentError::decode(WHAT, "count cell is not a number"))?;
            out.push(FrequencyRow {
                urn,
                word: word.to_string(),
                count,
            });
        }
    }
    Ok(out)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
