use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Identifier of a server-side analysis pipeline, e.g. `duplicate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Modules that analyse several files together receive them under `files`.
    pub fn accepts_many(&self) -> bool {
        matches!(self.0.as_str(), "duplicate" | "image")
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(Self { name, path, size })
    }
}

/// Body returned by `POST /upload/{module}`. The schema belongs to the
/// server, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub files: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn is_failure(&self) -> bool {
        self.status.as_deref() == Some("failed") || self.result.as_deref() == Some("ERROR")
    }

    pub fn result_label(&self) -> &str {
        self.result.as_deref().unwrap_or_default()
    }

    pub fn score_value(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// `files` is a count for current servers but may be free text.
    pub fn files_display(&self) -> String {
        match &self.files {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => "n/a".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAction {
    Block,
    Unblock,
}

impl BlockAction {
    /// Reads the intent off the control's current label ("Block" / "Unblock").
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.starts_with("unblock") {
            BlockAction::Unblock
        } else if label.contains("block") {
            BlockAction::Block
        } else {
            BlockAction::Unblock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockAction::Block => "block",
            BlockAction::Unblock => "unblock",
        }
    }
}

/// A row of `GET /admin/users`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub blocked: bool,
    #[serde(default)]
    pub last_active: Option<String>,
}

impl UserRecord {
    pub fn control_label(&self) -> &'static str {
        if self.blocked {
            "Unblock"
        } else {
            "Block"
        }
    }
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_file_modules() {
        assert!(ModuleId::new("duplicate").accepts_many());
        assert!(ModuleId::new("image").accepts_many());
        assert!(!ModuleId::new("text").accepts_many());
        assert!(!ModuleId::new("Image").accepts_many());
    }

    #[test]
    fn failure_detection() {
        let failed: AnalysisResponse =
            serde_json::from_str(r#"{"status":"failed","error":"bad file"}"#).unwrap();
        assert!(failed.is_failure());

        let error: AnalysisResponse =
            serde_json::from_str(r#"{"status":"success","result":"ERROR","score":0}"#).unwrap();
        assert!(error.is_failure());

        let ok: AnalysisResponse =
            serde_json::from_str(r#"{"status":"ok","result":"REAL","score":64}"#).unwrap();
        assert!(!ok.is_failure());
    }

    #[test]
    fn score_accepts_numbers_and_strings() {
        let r: AnalysisResponse = serde_json::from_str(r#"{"score":"42.5"}"#).unwrap();
        assert_eq!(r.score, Some(42.5));
        let r: AnalysisResponse = serde_json::from_str(r#"{"score":null}"#).unwrap();
        assert_eq!(r.score, None);
    }

    #[test]
    fn files_display_handles_count_and_text() {
        let r: AnalysisResponse = serde_json::from_str(r#"{"files":2}"#).unwrap();
        assert_eq!(r.files_display(), "2");
        let r: AnalysisResponse = serde_json::from_str(r#"{"files":"a.txt, b.txt"}"#).unwrap();
        assert_eq!(r.files_display(), "a.txt, b.txt");
    }

    #[test]
    fn block_action_from_label() {
        assert_eq!(BlockAction::from_label("Block"), BlockAction::Block);
        assert_eq!(BlockAction::from_label("  Unblock "), BlockAction::Unblock);
        assert_eq!(BlockAction::from_label("🚫 block user"), BlockAction::Block);
        assert_eq!(BlockAction::from_label("Restore"), BlockAction::Unblock);
    }

    #[test]
    fn user_blocked_flag_accepts_ints() {
        let users: Vec<UserRecord> = serde_json::from_str(
            r#"[{"id":1,"email":"a@x","blocked":1},{"id":2,"blocked":false}]"#,
        )
        .unwrap();
        assert!(users[0].blocked);
        assert_eq!(users[0].control_label(), "Unblock");
        assert!(!users[1].blocked);
        assert_eq!(users[1].control_label(), "Block");
    }
}
