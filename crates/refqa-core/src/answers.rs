//! Question, answer, and ground-truth files, and retrieval accuracy scoring.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::controller::Answer;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub qid: u64,
    pub query: String,
    pub category: String,
    /// Candidate source ids; informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
}

impl QuestionSet {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a question set.
    pub async fn read(path: &Path) -> Result<Self> {
        read_json(path).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub qid: u64,
    /// Selected source id, `None` when nothing was retrieved.
    pub retrieve: Option<i64>,
    pub query: String,
    pub category: String,
    pub response: String,
}

impl AnswerRecord {
    #[must_use]
    pub fn new(question: &Question, answer: &Answer) -> Self {
        let retrieve = answer.sources.first().and_then(|source| {
            let parsed = source.parse().ok();
            if parsed.is_none() {
                tracing::warn!(qid = question.qid, %source, "source id is not numeric");
            }
            parsed
        });
        Self {
            qid: question.qid,
            retrieve,
            query: question.query.clone(),
            category: question.category.clone(),
            response: answer.response.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    #[serde(alias = "ansewers")]
    pub answers: Vec<AnswerRecord>,
}

impl AnswerSet {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an answer set.
    pub async fn read(path: &Path) -> Result<Self> {
        read_json(path).await
    }

    /// Pretty-print to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write(&self, path: &Path) -> Result<()> {
        refqa_corpus::json::write_pretty(path, self).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub qid: u64,
    pub retrieve: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruthSet {
    pub ground_truths: Vec<GroundTruth>,
}

impl GroundTruthSet {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a ground-truth set.
    pub async fn read(path: &Path) -> Result<Self> {
        read_json(path).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyReport {
    pub total: usize,
    pub matching: usize,
    /// `matching / total` rounded to two decimals.
    pub ratio: f64,
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {}, matching retrieve: {}, ratio: {:.2}",
            self.total, self.matching, self.ratio
        )
    }
}

/// Compare each answered question's retrieved source with the ground truth.
///
/// Answers are keyed by qid, so a repeated qid counts once with its last
/// answer. Unanswered retrievals never match.
#[must_use]
pub fn score(answers: &[AnswerRecord], ground_truths: &[GroundTruth]) -> AccuracyReport {
    let expected: HashMap<u64, i64> = ground_truths
        .iter()
        .map(|truth| (truth.qid, truth.retrieve))
        .collect();
    let predicted: BTreeMap<u64, Option<i64>> = answers
        .iter()
        .map(|answer| (answer.qid, answer.retrieve))
        .collect();

    let total = predicted.len();
    let matching = predicted
        .iter()
        .filter(|&(qid, retrieve)| retrieve.is_some() && expected.get(qid).copied() == *retrieve)
        .count();

    #[allow(clippy::cast_precision_loss)]
    let ratio = if total == 0 {
        0.0
    } else {
        (matching as f64 / total as f64 * 100.0).round() / 100.0
    };
    AccuracyReport {
        total,
        matching,
        ratio,
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes).map_err(|source| CoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
