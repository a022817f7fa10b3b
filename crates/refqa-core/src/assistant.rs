use std::sync::Arc;

use refqa_corpus::TextFn;
use refqa_llm::{LlmError, LlmProvider, TextFuture};

use crate::prompt::{ANSWER, DOCUMENT_SUMMARY, OCR_CLEANUP, PromptTemplate};

/// Returned by [`Assistant::answer`] when there is nothing to answer from.
pub const INVALID_INPUT_RESPONSE: &str = "Invalid input provided.";

/// Prompted LLM calls used by ingestion and question answering.
#[derive(Debug)]
pub struct Assistant<P> {
    provider: Arc<P>,
}

impl<P> Clone for Assistant<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: LlmProvider + 'static> Assistant<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Tidy raw OCR output without changing its content.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    pub async fn format_ocr_text(&self, ocr_text: &str) -> Result<String, LlmError> {
        self.complete(OCR_CLEANUP, &[("input", ocr_text)]).await
    }

    /// Condense a document into a keyword-preserving summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    pub async fn summarize_document(&self, document: &str) -> Result<String, LlmError> {
        self.complete(DOCUMENT_SUMMARY, &[("input", document)]).await
    }

    /// Answer `question` from `rag_content` only.
    ///
    /// An empty context or question yields [`INVALID_INPUT_RESPONSE`] without
    /// calling the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    pub async fn answer(&self, rag_content: &str, question: &str) -> Result<String, LlmError> {
        if rag_content.is_empty() || question.is_empty() {
            tracing::warn!(
                context_len = rag_content.len(),
                question_len = question.len(),
                "empty answer input"
            );
            return Ok(INVALID_INPUT_RESPONSE.to_owned());
        }
        self.complete(ANSWER, &[("rag_content", rag_content), ("input", question)])
            .await
    }

    /// [`format_ocr_text`](Self::format_ocr_text) as a corpus text transform.
    #[must_use]
    pub fn ocr_formatter(&self) -> TextFn {
        let assistant = self.clone();
        Box::new(move |text: &str| -> TextFuture {
            let assistant = assistant.clone();
            let text = text.to_owned();
            Box::pin(async move { assistant.format_ocr_text(&text).await })
        })
    }

    /// [`summarize_document`](Self::summarize_document) as a corpus text transform.
    #[must_use]
    pub fn summarizer(&self) -> TextFn {
        let assistant = self.clone();
        Box::new(move |text: &str| -> TextFuture {
            let assistant = assistant.clone();
            let text = text.to_owned();
            Box::pin(async move { assistant.summarize_document(&text).await })
        })
    }

    async fn complete(
        &self,
        template: PromptTemplate,
        vars: &[(&str, &str)],
    ) -> Result<String, LlmError> {
        let messages = template.render(vars);
        self.provider.chat(&messages).await
    }
}
