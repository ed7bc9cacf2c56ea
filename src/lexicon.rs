//! # Polarity lexicons
//! Positive and negative word lists, one lowercase term per line.
//!
//! A local file wins when it exists; otherwise the list is downloaded from the
//! configured URL template (NorSentLex full-form lists by default). A source
//! that cannot be read is an error: scoring against an empty lexicon would
//! quietly produce all-zero results.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::LexiconConfig;
use crate::error::{Result, SentimentError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    /// Capitalized form used in the NorSentLex file names.
    pub fn file_label(self) -> &'static str {
        match self {
            Polarity::Positive => "Positive",
            Polarity::Negative => "Negative",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable set of word-forms for one polarity.
#[derive(Debug, Clone)]
pub struct Lexicon {
    polarity: Polarity,
    terms: HashSet<String>,
    source: String,
}

impl Lexicon {
    pub fn from_terms<I, S>(polarity: Polarity, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            polarity,
            terms,
            source: "inline".to_string(),
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Where the terms came from (file path or URL).
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Parse a line-delimited list: no header, trimmed, lowercased, blanks skipped.
pub fn parse_terms(text: &str) -> HashSet<String> {
    text.lines()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}

pub fn lexicon_url(template: &str, polarity: Polarity) -> String {
    template.replace("{polarity}", polarity.file_label())
}

/// Load one lexicon from `path` if it exists, else from the polarity's URL.
pub async fn load_lexicon(
    polarity: Polarity,
    path: Option<&Path>,
    url_template: &str,
    client: &reqwest::Client,
) -> Result<Lexicon> {
    let what = format!("{polarity} lexicon");

    let (text, source) = match path {
        Some(p) if p.exists() => {
            let text = tokio::fs::read_to_string(p)
                .await
                .map_err(|e| read_error(&what, e))?;
            (text, p.display().to_string())
        }
        other => {
            if let Some(p) = other {
                warn!(
                    path = %p.display(),
                    polarity = polarity.as_str(),
                    "lexicon path does not exist, falling back to remote list"
                );
            }
            let url = lexicon_url(url_template, polarity);
            let text = fetch_text(client, &url, &what).await?;
            (text, url)
        }
    };

    let terms = parse_terms(&text);
    if terms.is_empty() {
        return Err(SentimentError::decode(what, format!("no terms in {source}")));
    }

    info!(
        polarity = polarity.as_str(),
        terms = terms.len(),
        %source,
        "lexicon loaded"
    );
    Ok(Lexicon {
        polarity,
        terms,
        source,
    })
}

fn read_error(what: &str, e: std::io::Error) -> SentimentError {
    if e.kind() == std::io::ErrorKind::InvalidData {
        SentimentError::decode(what, e)
    } else {
        SentimentError::unavailable(what, e)
    }
}

async fn fetch_text(client: &reqwest::Client, url: &str, what: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| SentimentError::unavailable(what, e))?;
    let resp = resp
        .error_for_status()
        .map_err(|e| SentimentError::unavailable(what, e))?;
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| SentimentError::unavailable(what, e))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| SentimentError::decode(what, e))
}

/// Both polarities, loaded once per process.
#[derive(Debug, Clone)]
pub struct LexiconPair {
    pub positive: Lexicon,
    pub negative: Lexicon,
}

impl LexiconPair {
    pub fn new(positive: Lexicon, negative: Lexicon) -> Self {
        Self { positive, negative }
    }

    pub fn from_terms<P, N, S, T>(positive: P, negative: N) -> Self
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
        N: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            positive: Lexicon::from_terms(Polarity::Positive, positive),
            negative: Lexicon::from_terms(Polarity::Negative, negative),
        }
    }

    pub async fn load(cfg: &LexiconConfig, client: &reqwest::Client) -> Result<Self> {
        let positive = load_lexicon(
            Polarity::Positive,
            cfg.positive_path.as_deref(),
            &cfg.url_template,
            client,
        )
        .await?;
        let negative = load_lexicon(
            Polarity::Negative,
            cfg.negative_path.as_deref(),
            &cfg.url_template,
            client,
        )
        .await?;

        let overlap = positive
            .terms
            .iter()
            .filter(|t| negative.contains(t))
            .count();
        if overlap > 0 {
            warn!(overlap, "lexicons share terms; shared terms count as positive");
        }
        Ok(Self { positive, negative })
    }
}
