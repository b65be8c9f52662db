use crate::app::presentation::ResultPanel;
use crate::upload::{AnalysisResponse, FileCollector, ModuleId, SelectedFile, UploadError, UserRecord};
use std::time::{Duration, Instant};

pub type SubmissionId = u64;

pub const START_PROGRESS: f32 = 0.10;
pub const RESPONSE_PROGRESS: f32 = 0.90;

/// One module card: its file selection and the result region it owns.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub module: ModuleId,
    pub title: String,
    pub description: String,
    pub collector: FileCollector,
    pub selected: Vec<SelectedFile>,
    pub result: ResultPanel,
    pub in_flight: usize,
}

impl UploadForm {
    pub fn new(module: ModuleId, title: String, description: String, collector: FileCollector) -> Self {
        Self {
            module,
            title,
            description,
            collector,
            selected: Vec::new(),
            result: ResultPanel::Empty,
            in_flight: 0,
        }
    }

    pub fn set_selection(&mut self, files: Vec<SelectedFile>) {
        if self.module.accepts_many() {
            self.selected = files;
        } else {
            self.selected = files.into_iter().take(1).collect();
        }
    }

    pub fn add_files(&mut self, files: Vec<SelectedFile>) {
        for file in files {
            if !self.selected.iter().any(|f| f.path == file.path) {
                self.selected.push(file);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn total_size(&self) -> u64 {
        self.selected.iter().map(|f| f.size).sum()
    }

    pub fn running_hint(&self) -> Option<String> {
        match self.in_flight {
            0 => None,
            1 => Some("1 analysis running".to_string()),
            n => Some(format!("{} analyses running", n)),
        }
    }
}

/// Progress card for a single submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub id: SubmissionId,
    pub description: String,
    pub progress: f32,
    pub progress_label: String,
    pub hide_at: Option<Instant>,
}

impl Overlay {
    pub fn new(id: SubmissionId, description: String) -> Self {
        Self {
            id,
            description,
            progress: START_PROGRESS,
            progress_label: "Starting...".to_string(),
            hide_at: None,
        }
    }

    pub fn set_progress(&mut self, fraction: f32, label: impl Into<String>) {
        self.progress = fraction.clamp(0.0, 1.0);
        self.progress_label = label.into();
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.hide_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
pub struct Overlays {
    items: Vec<Overlay>,
}

impl Overlays {
    pub fn open(&mut self, id: SubmissionId, description: String) {
        self.items.push(Overlay::new(id, description));
    }

    #[cfg(test)]
    pub fn get(&self, id: SubmissionId) -> Option<&Overlay> {
        self.items.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: SubmissionId) -> Option<&mut Overlay> {
        self.items.iter_mut().find(|o| o.id == id)
    }

    pub fn hide(&mut self, id: SubmissionId) {
        self.items.retain(|o| o.id != id);
    }

    pub fn hide_after(&mut self, id: SubmissionId, now: Instant, delay: Duration) {
        if let Some(overlay) = self.get_mut(id) {
            overlay.hide_at = Some(now + delay);
        }
    }

    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|o| !o.is_expired(now));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.items.iter().filter_map(|o| o.hide_at).min()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.items.iter()
    }
}

/// Results reported back to the UI thread by network workers.
#[derive(Debug)]
pub enum WorkerEvent {
    UploadFinished {
        submission: SubmissionId,
        form: usize,
        result: Result<AnalysisResponse, UploadError>,
    },
    BlockFinished {
        user_id: String,
        result: Result<(), UploadError>,
    },
    UsersLoaded(Result<Vec<UserRecord>, UploadError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Analyze,
    Admin,
    Session,
}
