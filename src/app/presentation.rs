//! Turns submission state and server responses into what a module card shows.
//! Everything here is pure so the desktop and headless front ends share it.

use crate::upload::{AnalysisResponse, ModuleId, SelectedFile};
use std::fmt;

pub const NO_FILES_TEXT: &str = "📁 Please select file(s)";
pub const EMAIL_NOTICE: &str = "✉️ Email report sent to your registered email address";
pub const NETWORK_ERROR_TEXT: &str = "Network error or server unavailable";
pub const UNKNOWN_ERROR_TEXT: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Danger,
}

pub fn tone_for_score(score: f64) -> Tone {
    if score > 70.0 {
        Tone::Success
    } else if score > 40.0 {
        Tone::Warning
    } else {
        Tone::Danger
    }
}

/// Every matching check overrides the previous one, so the last match in
/// this order decides the icon.
pub fn icon_for_result(label: &str) -> &'static str {
    let mut icon = "📊";
    if label.contains("AI") || label.contains("GENERATED") {
        icon = "🤖";
    }
    if label.contains("HUMAN") {
        icon = "👤";
    }
    if label.contains("UNIQUE") {
        icon = "✓";
    }
    if label.contains("REAL") {
        icon = "📸";
    }
    if label.contains("DUPLICATE") {
        icon = "⚠️";
    }
    icon
}

pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{}", score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessPanel {
    pub tone: Tone,
    pub icon: &'static str,
    pub label: String,
    pub score: f64,
    pub files: String,
    pub details: String,
}

/// Contents of a card's result region.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultPanel {
    #[default]
    Empty,
    NoFiles,
    Processing {
        module: String,
        file_count: usize,
    },
    AnalysisFailed {
        message: String,
    },
    Success(SuccessPanel),
    UploadFailed {
        detail: String,
    },
}

impl ResultPanel {
    pub fn processing(module: &ModuleId, file_count: usize) -> Self {
        ResultPanel::Processing {
            module: module.as_str().to_uppercase(),
            file_count,
        }
    }

    pub fn from_response(response: &AnalysisResponse) -> Self {
        if response.is_failure() {
            let message = [&response.message, &response.error]
                .into_iter()
                .flatten()
                .find(|text| !text.is_empty())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_ERROR_TEXT.to_string());
            return ResultPanel::AnalysisFailed { message };
        }

        let score = response.score_value();
        let label = response.result_label().to_string();
        ResultPanel::Success(SuccessPanel {
            tone: tone_for_score(score),
            icon: icon_for_result(&label),
            label,
            score,
            files: response.files_display(),
            details: response.message.clone().unwrap_or_default(),
        })
    }

    pub fn upload_failed(error: &dyn fmt::Display) -> Self {
        ResultPanel::UploadFailed {
            detail: error.to_string(),
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            ResultPanel::Empty | ResultPanel::Processing { .. } => Tone::Info,
            ResultPanel::NoFiles => Tone::Warning,
            ResultPanel::AnalysisFailed { .. } | ResultPanel::UploadFailed { .. } => Tone::Danger,
            ResultPanel::Success(panel) => panel.tone,
        }
    }

    pub fn score_bar(&self) -> Option<f64> {
        match self {
            ResultPanel::Success(panel) => Some(panel.score),
            _ => None,
        }
    }

    /// Plain-text rendering, one entry per visual line.
    pub fn lines(&self) -> Vec<String> {
        match self {
            ResultPanel::Empty => Vec::new(),
            ResultPanel::NoFiles => vec![NO_FILES_TEXT.to_string()],
            ResultPanel::Processing { module, file_count } => vec![
                "⏳ Processing...".to_string(),
                format!("Module: {}  •  Files: {}", module, file_count),
            ],
            ResultPanel::AnalysisFailed { message } => {
                vec!["❌ Analysis Failed".to_string(), message.clone()]
            }
            ResultPanel::Success(panel) => vec![
                format!("{} {}", panel.icon, panel.label),
                format!("Score: {}%", format_score(panel.score)),
                format!("Files analyzed: {}", panel.files),
                format!("Details: {}", panel.details),
                EMAIL_NOTICE.to_string(),
            ],
            ResultPanel::UploadFailed { detail } => vec![
                "❌ Upload Failed".to_string(),
                NETWORK_ERROR_TEXT.to_string(),
                detail.clone(),
            ],
        }
    }
}

pub fn overlay_description(module: &ModuleId, files: &[SelectedFile]) -> String {
    let names = files
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Module: {} — Files: {} ({})",
        module.as_str().to_uppercase(),
        files.len(),
        names
    )
}

/// Label of the overlay bar once the server has answered.
pub fn response_progress_label(response: &AnalysisResponse) -> String {
    match response.score {
        Some(score) if score != 0.0 => format!("{}%", format_score(score)),
        _ => "Finalizing...".to_string(),
    }
}

pub fn done_description(response: &AnalysisResponse) -> String {
    format!(
        "Done — {} ({}%)",
        response.result_label(),
        format_score(response.score_value())
    )
}
