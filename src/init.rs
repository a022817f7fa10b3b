use std::path::Path;

use anyhow::{Context, bail};
use refqa_core::config::{Config, OPENAI_KEY_VARS, ProviderKind};

/// Write the default configuration to `path`.
///
/// # Errors
///
/// Returns an error if `path` exists and `force` is not set, or the file
/// cannot be written.
pub fn run(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite", path.display());
    }

    let config = Config::default();
    let toml_str = render(&config)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, &toml_str)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Config written to {}", path.display());

    print_next_steps(&config, path);
    Ok(())
}

fn render(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

fn print_next_steps(config: &Config, path: &Path) {
    println!("\nNext steps:");
    if config.llm.provider == ProviderKind::OpenAi {
        println!("  1. export {}=\"<your-api-key>\" (or put it in .env)", OPENAI_KEY_VARS[0]);
    } else {
        println!("  1. Start Ollama at {}", config.llm.base_url());
    }
    println!(
        "  2. Run: refqa --config {} run --question-path <questions.json> --source-path <reference dir> --output-path <answers.json>",
        path.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_config_loads_back_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config/default.toml");
        run(&path, false).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.categories, Config::default().categories);
        assert_eq!(parsed.llm.model, Config::default().llm.model);
        assert!(!raw.contains("openai_api_key"));
    }

    #[test]
    fn existing_file_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# keep").unwrap();

        let err = run(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# keep");

        run(&path, true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[llm]"));
    }
}
