use std::io::Write;
use std::path::{Path, PathBuf};

use refqa_index::SelectionPolicy;
use serial_test::serial;

use super::*;
use crate::secret::Secret;

const ENV_KEYS: [&str; 24] = [
    "REFQA_CONFIG",
    "REFQA_LLM_PROVIDER",
    "REFQA_LLM_BASE_URL",
    "REFQA_LLM_MODEL",
    "REFQA_LLM_EMBEDDING_MODEL",
    "REFQA_LLM_MAX_TOKENS",
    "REFQA_LLM_MAX_RETRIES",
    "REFQA_DATA_DIR",
    "REFQA_INDEX_DIR",
    "REFQA_INGEST_MIN_IMAGE_WIDTH",
    "REFQA_INGEST_MIN_IMAGE_HEIGHT",
    "REFQA_INGEST_SAVE_EVERY",
    "REFQA_INGEST_MIN_OCR_CHARS",
    "REFQA_TESSERACT",
    "REFQA_OCR_LANGUAGES",
    "REFQA_INDEX_BACKEND",
    "REFQA_QDRANT_URL",
    "REFQA_INDEX_COLLECTION_PREFIX",
    "REFQA_INDEX_TOP_K",
    "REFQA_INDEX_SELECTION",
    "REFQA_INDEX_MIN_SCORE",
    "REFQA_CATEGORIES",
    "OPENAI_API_KEY",
    "REFQA_OPENAI_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn defaults_when_file_missing() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/refqa.toml")).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.base_url(), "https://api.openai.com/v1");
    assert_eq!(config.paths.data_dir, PathBuf::from("data/formatted_data"));
    assert_eq!(config.paths.index_dir, PathBuf::from("data/index"));
    assert_eq!(config.ingest.min_image_width, 500);
    assert_eq!(config.ingest.save_every, 100);
    assert_eq!(config.ingest.min_ocr_chars, 30);
    assert_eq!(config.ingest.ocr_languages, "eng+chi_tra");
    assert_eq!(config.index.backend, IndexBackendKind::Local);
    assert_eq!(config.index.top_k, 5);
    assert_eq!(config.categories, ["finance", "insurance", "faq"]);
    assert!(config.secrets.openai_api_key.is_none());
}

#[test]
#[serial]
fn parses_partial_toml() {
    clear_env();
    let file = write_config(
        r#"
categories = ["finance"]

[llm]
provider = "ollama"
model = "qwen2.5"
embedding_model = "bge-m3"

[index]
selection = "threshold"
min_score = 0.4
"#,
    );
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.llm.base_url(), "http://localhost:11434");
    assert_eq!(config.llm.embedding_model, "bge-m3");
    assert_eq!(config.llm.max_retries, 3);
    assert_eq!(config.categories, ["finance"]);
    assert_eq!(config.index.top_k, 5);
    assert_eq!(
        config.index.settings().selection,
        SelectionPolicy::Threshold { min_score: 0.4 }
    );
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    clear_env();
    let file = write_config("[llm\nprovider = ");
    let err = Config::load(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn unknown_provider_in_file_is_an_error() {
    clear_env();
    let file = write_config("[llm]\nprovider = \"claude\"\n");
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides_scalars() {
    clear_env();
    unsafe {
        std::env::set_var("REFQA_LLM_PROVIDER", "Ollama");
        std::env::set_var("REFQA_LLM_BASE_URL", "http://gpu-box:11434");
        std::env::set_var("REFQA_LLM_MAX_TOKENS", "256");
        std::env::set_var("REFQA_DATA_DIR", "/srv/refqa/formatted");
        std::env::set_var("REFQA_INGEST_SAVE_EVERY", "10");
        std::env::set_var("REFQA_OCR_LANGUAGES", "eng");
        std::env::set_var("REFQA_INDEX_BACKEND", "qdrant");
        std::env::set_var("REFQA_INDEX_TOP_K", "3");
        std::env::set_var("REFQA_CATEGORIES", "finance, faq,");
    }
    let config = Config::load(Path::new("/nonexistent/refqa.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.llm.base_url(), "http://gpu-box:11434");
    assert_eq!(config.llm.max_tokens, 256);
    assert_eq!(config.paths.data_dir, PathBuf::from("/srv/refqa/formatted"));
    assert_eq!(config.ingest.save_every, 10);
    assert_eq!(config.ingest.ocr_languages, "eng");
    assert_eq!(config.index.backend, IndexBackendKind::Qdrant);
    assert_eq!(config.index.top_k, 3);
    assert_eq!(config.categories, ["finance", "faq"]);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("REFQA_LLM_PROVIDER", "claude");
        std::env::set_var("REFQA_INDEX_TOP_K", "many");
        std::env::set_var("REFQA_CATEGORIES", " , ");
    }
    let config = Config::load(Path::new("/nonexistent/refqa.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.index.top_k, 5);
    assert_eq!(config.categories.len(), 3);
}

#[test]
#[serial]
fn api_key_is_read_from_either_variable() {
    clear_env();
    unsafe { std::env::set_var("REFQA_OPENAI_API_KEY", "sk-fallback") };
    let config = Config::load(Path::new("/nonexistent/refqa.toml")).unwrap();
    assert_eq!(
        config.secrets.openai_api_key.as_ref().map(Secret::expose),
        Some("sk-fallback")
    );

    unsafe { std::env::set_var("OPENAI_API_KEY", "sk-primary") };
    let config = Config::load(Path::new("/nonexistent/refqa.toml")).unwrap();
    clear_env();
    assert_eq!(
        config.secrets.openai_api_key.as_ref().map(Secret::expose),
        Some("sk-primary")
    );
}

#[test]
fn validate_requires_openai_key() {
    let mut config = Config::default();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("missing OPENAI_API_KEY"));

    config.secrets.openai_api_key = Some(Secret::new("sk-test"));
    assert!(config.validate().is_ok());
}

#[test]
fn validate_skips_key_for_ollama() {
    let mut config = Config::default();
    config.llm.provider = ProviderKind::Ollama;
    assert!(config.validate().is_ok());
}

#[test]
fn validate_rejects_bad_index_settings() {
    let mut config = Config::default();
    config.llm.provider = ProviderKind::Ollama;

    config.index.top_k = 0;
    assert!(config.validate().is_err());
    config.index.top_k = 5;

    config.index.min_score = 1.5;
    assert!(config.validate().is_err());
    config.index.min_score = f32::NAN;
    assert!(config.validate().is_err());
    config.index.min_score = -0.2;
    assert!(config.validate().is_ok());

    config.categories.clear();
    assert!(config.validate().is_err());
}

#[test]
fn secrets_are_not_serialized() {
    let mut config = Config::default();
    config.secrets.openai_api_key = Some(Secret::new("sk-hidden"));
    let rendered = toml::to_string(&config).unwrap();
    assert!(!rendered.contains("sk-hidden"));
    assert!(rendered.contains("gpt-4o-mini"));
}

#[test]
fn ingest_maps_to_pdf_config() {
    let mut ingest = IngestConfig::default();
    ingest.min_image_height = 640;
    let pdf = ingest.pdf_config();
    assert_eq!(pdf.min_image_width, 500);
    assert_eq!(pdf.min_image_height, 640);
    assert_eq!(pdf.min_ocr_chars, 30);
}

#[test]
#[serial]
fn config_path_resolution_order() {
    clear_env();
    assert_eq!(
        resolve_config_path(None),
        PathBuf::from(DEFAULT_CONFIG_PATH)
    );
    unsafe { std::env::set_var("REFQA_CONFIG", "/etc/refqa.toml") };
    assert_eq!(resolve_config_path(None), PathBuf::from("/etc/refqa.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("local.toml"))),
        PathBuf::from("local.toml")
    );
    clear_env();
}
