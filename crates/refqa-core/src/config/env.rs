use std::path::PathBuf;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use super::Config;
use crate::secret::Secret;

/// Environment variables checked for the OpenAI API key, in order.
pub const OPENAI_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "REFQA_OPENAI_API_KEY"];

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_paths();
        self.apply_env_overrides_ingest();
        self.apply_env_overrides_index();
        if let Ok(v) = std::env::var("REFQA_CATEGORIES") {
            let categories: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            if categories.is_empty() {
                tracing::warn!("ignoring empty REFQA_CATEGORIES value");
            } else {
                self.categories = categories;
            }
        }
        if let Some(key) = Secret::from_env(&OPENAI_KEY_VARS) {
            self.secrets.openai_api_key = Some(key);
        }
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Some(kind) = env_enum("REFQA_LLM_PROVIDER") {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("REFQA_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("REFQA_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("REFQA_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Some(n) = env_parse("REFQA_LLM_MAX_TOKENS") {
            self.llm.max_tokens = n;
        }
        if let Some(n) = env_parse("REFQA_LLM_MAX_RETRIES") {
            self.llm.max_retries = n;
        }
    }

    fn apply_env_overrides_paths(&mut self) {
        if let Ok(v) = std::env::var("REFQA_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("REFQA_INDEX_DIR") {
            self.paths.index_dir = PathBuf::from(v);
        }
    }

    fn apply_env_overrides_ingest(&mut self) {
        if let Some(n) = env_parse("REFQA_INGEST_MIN_IMAGE_WIDTH") {
            self.ingest.min_image_width = n;
        }
        if let Some(n) = env_parse("REFQA_INGEST_MIN_IMAGE_HEIGHT") {
            self.ingest.min_image_height = n;
        }
        if let Some(n) = env_parse("REFQA_INGEST_SAVE_EVERY") {
            self.ingest.save_every = n;
        }
        if let Some(n) = env_parse("REFQA_INGEST_MIN_OCR_CHARS") {
            self.ingest.min_ocr_chars = n;
        }
        if let Ok(v) = std::env::var("REFQA_TESSERACT") {
            self.ingest.tesseract = v;
        }
        if let Ok(v) = std::env::var("REFQA_OCR_LANGUAGES") {
            self.ingest.ocr_languages = v;
        }
    }

    fn apply_env_overrides_index(&mut self) {
        if let Some(kind) = env_enum("REFQA_INDEX_BACKEND") {
            self.index.backend = kind;
        }
        if let Ok(v) = std::env::var("REFQA_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("REFQA_INDEX_COLLECTION_PREFIX") {
            self.index.collection_prefix = v;
        }
        if let Some(n) = env_parse("REFQA_INDEX_TOP_K") {
            self.index.top_k = n;
        }
        if let Some(mode) = env_enum("REFQA_INDEX_SELECTION") {
            self.index.selection = mode;
        }
        if let Some(score) = env_parse("REFQA_INDEX_MIN_SCORE") {
            self.index.min_score = score;
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.trim().parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

/// Parse a lowercase enum value the same way the config file does.
fn env_enum<T: DeserializeOwned>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.to_lowercase())) {
        Some(kind)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}
