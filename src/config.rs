use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_HIDE_DELAY_MS: u64 = 1800;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub cookie: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub overlay_hide_delay_ms: u64,
    pub log_dir: Option<PathBuf>,
    pub theme: ThemeConfig,
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub accept: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub success: String,
    pub warning: String,
    pub danger: String,
    pub info: String,
    pub accent: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            success: "#198754".to_string(),
            warning: "#d39e00".to_string(),
            danger: "#dc3545".to_string(),
            info: "#0aa2c0".to_string(),
            accent: "#a159e1".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie: None,
            request_timeout_secs: Some(300),
            overlay_hide_delay_ms: DEFAULT_HIDE_DELAY_MS,
            log_dir: None,
            theme: ThemeConfig::default(),
            modules: default_modules(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn overlay_hide_delay(&self) -> Duration {
        Duration::from_millis(self.overlay_hide_delay_ms)
    }

    pub fn module(&self, id: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.id.trim() == id)
    }
}

const DOCUMENT_PATTERNS: [&str; 3] = ["*.pdf", "*.docx", "*.txt"];
const IMAGE_PATTERNS: [&str; 5] = ["*.jpg", "*.jpeg", "*.png", "*.webp", "*.bmp"];

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

pub fn default_modules() -> Vec<ModuleConfig> {
    vec![
        ModuleConfig {
            id: "duplicate".to_string(),
            title: "Document Grouping & Duplicates".to_string(),
            description: "Groups related documents and flags duplicated content.".to_string(),
            accept: patterns(&DOCUMENT_PATTERNS),
        },
        ModuleConfig {
            id: "text".to_string(),
            title: "AI Text Detection".to_string(),
            description: "Estimates whether a document was written by a human or generated."
                .to_string(),
            accept: patterns(&DOCUMENT_PATTERNS),
        },
        ModuleConfig {
            id: "image".to_string(),
            title: "Image Deepfake Detection".to_string(),
            description: "Checks photos for signs of AI generation.".to_string(),
            accept: patterns(&IMAGE_PATTERNS),
        },
    ]
}

fn validate_config(config: &AppConfig) -> anyhow::Result<()> {
    if config.base_url.trim().is_empty() {
        anyhow::bail!("base_url must not be empty");
    }
    if config.modules.is_empty() {
        anyhow::bail!("config must include at least one module");
    }
    for (index, module) in config.modules.iter().enumerate() {
        let id = module.id.trim();
        if id.is_empty() {
            anyhow::bail!("modules[{}] must set id", index);
        }
        validate_module_id(id)?;
        if config.modules[..index].iter().any(|m| m.id.trim() == id) {
            anyhow::bail!("module {} is declared twice", id);
        }
    }
    Ok(())
}

/// Module ids end up as the last segment of `/upload/{module}`.
pub fn validate_module_id(id: &str) -> anyhow::Result<()> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '?', '#'])
        || id.contains(char::is_whitespace)
    {
        anyhow::bail!("module {:?} id must be a single path segment", id);
    }
    Ok(())
}

pub fn parse_config(raw: &str) -> anyhow::Result<AppConfig> {
    let config: AppConfig = toml::from_str(raw)?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads `path`, or the built-in defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.overlay_hide_delay(), Duration::from_millis(1800));
        let ids: Vec<_> = config.modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["duplicate", "text", "image"]);
    }

    #[test]
    fn overrides_and_custom_modules() {
        let input = r##"
base_url = "https://sentinai.example"
cookie = "session=abc"
overlay_hide_delay_ms = 500
request_timeout_secs = 0

[theme]
success = "#00ff00"

[[modules]]
id = "image"
title = "Images"
accept = ["*.png"]
"##;
        let config = parse_config(input).unwrap();
        assert_eq!(config.cookie.as_deref(), Some("session=abc"));
        assert_eq!(config.overlay_hide_delay_ms, 500);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.theme.success, "#00ff00");
        assert_eq!(config.theme.danger, "#dc3545");
        assert_eq!(config.modules.len(), 1);
        assert_eq!(config.module("image").unwrap().accept, vec!["*.png"]);
    }

    #[test]
    fn example_config_matches_defaults() {
        let config = parse_config(include_str!("../config/sentinai.example.toml")).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.base_url, defaults.base_url);
        assert_eq!(config.modules.len(), defaults.modules.len());
        for (a, b) in config.modules.iter().zip(&defaults.modules) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.accept, b.accept);
        }
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(parse_config("base_url = \"  \"").is_err());
    }

    #[test]
    fn module_ids_must_be_unique_path_segments() {
        let dup = r#"
[[modules]]
id = "text"
title = "a"

[[modules]]
id = "text"
title = "b"
"#;
        assert!(parse_config(dup).is_err());

        let nested = r#"
[[modules]]
id = "a/b"
title = "a"
"#;
        assert!(parse_config(nested).is_err());

        let padded = r#"
[[modules]]
id = " text"
title = "a"

[[modules]]
id = "text"
title = "b"
"#;
        assert!(parse_config(padded).is_err());
    }

    #[test]
    fn module_id_must_not_escape_upload_path() {
        assert!(validate_module_id("image").is_ok());
        for id in ["../admin/block", "..", "a\\b", "a?b", "a#b", "", "a b"] {
            assert!(validate_module_id(id).is_err(), "{:?} accepted", id);
        }
    }

    #[test]
    fn module_requires_title() {
        let input = r#"
[[modules]]
id = "text"
"#;
        assert!(parse_config(input).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Some(Path::new("/nope/sentinai.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("/nope/sentinai.toml"));
    }
}
