use std::fmt;
use std::path::PathBuf;

use refqa_corpus::PdfExtractorConfig;
use refqa_index::{IndexSettings, SelectionPolicy};
use serde::{Deserialize, Serialize};

use crate::secret::Secret;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            paths: PathsConfig::default(),
            ingest: IngestConfig::default(),
            index: IndexConfig::default(),
            categories: default_categories(),
            secrets: ResolvedSecrets::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}

pub(crate) fn default_categories() -> Vec<String> {
    ["finance", "insurance", "faq"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// LLM provider backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Provider endpoint; the provider's well-known URL when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: default_model(),
            embedding_model: default_embedding_model(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/formatted_data")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("data/index")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Corpus and summary JSON files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Local index snapshots.
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            index_dir: default_index_dir(),
        }
    }
}

fn default_min_image_side() -> u32 {
    500
}

fn default_save_every() -> usize {
    100
}

fn default_min_ocr_chars() -> usize {
    30
}

fn default_tesseract() -> String {
    "tesseract".into()
}

fn default_ocr_languages() -> String {
    "eng+chi_tra".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    #[serde(default = "default_min_image_side")]
    pub min_image_width: u32,
    #[serde(default = "default_min_image_side")]
    pub min_image_height: u32,
    #[serde(default = "default_save_every")]
    pub save_every: usize,
    #[serde(default = "default_min_ocr_chars")]
    pub min_ocr_chars: usize,
    #[serde(default = "default_tesseract")]
    pub tesseract: String,
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            min_image_width: default_min_image_side(),
            min_image_height: default_min_image_side(),
            save_every: default_save_every(),
            min_ocr_chars: default_min_ocr_chars(),
            tesseract: default_tesseract(),
            ocr_languages: default_ocr_languages(),
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn pdf_config(&self) -> PdfExtractorConfig {
        PdfExtractorConfig {
            min_image_width: self.min_image_width,
            min_image_height: self.min_image_height,
            save_every: self.save_every,
            min_ocr_chars: self.min_ocr_chars,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackendKind {
    #[default]
    Local,
    Qdrant,
}

/// How many of the top hits feed the answer prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Only the highest-scoring hit.
    #[default]
    Best,
    /// Every hit scoring strictly above `min_score`, or the best hit when none does.
    Threshold,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection_prefix() -> String {
    "refqa".into()
}

fn default_top_k() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: IndexBackendKind,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,
    #[serde(default = "default_top_k")]
    pub top_k: u64,
    #[serde(default)]
    pub selection: SelectionMode,
    /// Cosine score cutoff for `threshold` selection.
    #[serde(default)]
    pub min_score: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackendKind::default(),
            qdrant_url: default_qdrant_url(),
            collection_prefix: default_collection_prefix(),
            top_k: default_top_k(),
            selection: SelectionMode::default(),
            min_score: 0.0,
        }
    }
}

impl IndexConfig {
    #[must_use]
    pub fn settings(&self) -> IndexSettings {
        let selection = match self.selection {
            SelectionMode::Best => SelectionPolicy::Best,
            SelectionMode::Threshold => SelectionPolicy::Threshold {
                min_score: self.min_score,
            },
        };
        IndexSettings {
            collection_prefix: self.collection_prefix.clone(),
            top_k: self.top_k,
            selection,
        }
    }
}
