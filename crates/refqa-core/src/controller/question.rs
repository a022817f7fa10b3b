use std::sync::Arc;

use refqa_index::IndexManager;
use refqa_llm::LlmProvider;

use crate::answers::{AnswerRecord, AnswerSet, QuestionSet};
use crate::assistant::Assistant;
use crate::error::Result;
use crate::progress::progress_bar;

/// Response for questions too short to search with.
pub const INVALID_QUESTION_RESPONSE: &str = "Invalid input.";
/// Response recorded when the answer call fails after retrieval succeeded.
pub const ANSWER_FAILED_RESPONSE: &str = "An error occurred while processing the request.";

const MIN_QUESTION_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub response: String,
    /// Retrieved source ids, best first.
    pub sources: Vec<String>,
}

impl Answer {
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            response: INVALID_QUESTION_RESPONSE.to_owned(),
            sources: Vec::new(),
        }
    }
}

pub struct QuestionController<P> {
    index: Arc<IndexManager<P>>,
    assistant: Assistant<P>,
}

impl<P> std::fmt::Debug for QuestionController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionController").finish_non_exhaustive()
    }
}

impl<P: LlmProvider + 'static> QuestionController<P> {
    pub fn new(index: Arc<IndexManager<P>>, assistant: Assistant<P>) -> Self {
        Self { index, assistant }
    }

    /// Retrieve the best source for `question` within `category` and answer from it.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails. A failed answer call is not an
    /// error: it is logged and [`ANSWER_FAILED_RESPONSE`] is returned with the
    /// retrieved sources.
    pub async fn handle_question(&self, question: &str, category: &str) -> Result<Answer> {
        if question.trim().is_empty() || question.chars().count() < MIN_QUESTION_CHARS {
            tracing::warn!(category, "received empty or invalid question");
            return Ok(Answer::invalid());
        }

        let retrieval = self.index.search(question, category).await?;
        let response = match self.assistant.answer(&retrieval.context, question).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(category, sources = ?retrieval.sources, "answer generation failed: {e}");
                ANSWER_FAILED_RESPONSE.to_owned()
            }
        };

        Ok(Answer {
            response,
            sources: retrieval.sources,
        })
    }

    /// Answer every question in order. A question whose retrieval fails is
    /// recorded with [`ANSWER_FAILED_RESPONSE`] and no source.
    pub async fn answer_all(&self, set: &QuestionSet) -> AnswerSet {
        let bar = progress_bar(set.questions.len() as u64, "answering");
        let mut answers = Vec::with_capacity(set.questions.len());
        for question in &set.questions {
            let answer = match self.handle_question(&question.query, &question.category).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(qid = question.qid, category = %question.category, "question failed: {e}");
                    Answer {
                        response: ANSWER_FAILED_RESPONSE.to_owned(),
                        sources: Vec::new(),
                    }
                }
            };
            answers.push(AnswerRecord::new(question, &answer));
            bar.inc(1);
        }
        bar.finish_and_clear();
        AnswerSet { answers }
    }
}
