use crate::app::presentation::{self, ResultPanel};
use crate::app::state::{Overlays, SubmissionId, UploadForm, WorkerEvent, RESPONSE_PROGRESS};
use crate::config::ModuleConfig;
use crate::upload::{AnalysisResponse, FileCollector, ModuleId, SelectedFile, SentinelClient, UploadError};
use std::time::{Duration, Instant};

/// A submission that passed the precondition check and still has to hit the network.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub submission: SubmissionId,
    pub form: usize,
    pub module: ModuleId,
    pub files: Vec<SelectedFile>,
}

impl PendingUpload {
    pub async fn run(self, client: SentinelClient) -> WorkerEvent {
        let result = client.upload(&self.module, &self.files).await;
        WorkerEvent::UploadFinished {
            submission: self.submission,
            form: self.form,
            result,
        }
    }
}

/// Owns the module cards and their overlays. All mutation happens on the UI
/// thread; workers only hand back `WorkerEvent`s.
#[derive(Debug)]
pub struct FormController {
    pub forms: Vec<UploadForm>,
    pub overlays: Overlays,
    hide_delay: Duration,
    next_submission: SubmissionId,
}

impl FormController {
    pub fn init(modules: &[ModuleConfig], hide_delay: Duration) -> Self {
        let forms = modules
            .iter()
            .map(|m| {
                UploadForm::new(
                    ModuleId::new(m.id.trim()),
                    m.title.clone(),
                    m.description.clone(),
                    FileCollector::new(&m.accept),
                )
            })
            .collect::<Vec<_>>();
        tracing::info!(forms = forms.len(), "upload forms ready");
        Self {
            forms,
            overlays: Overlays::default(),
            hide_delay,
            next_submission: 1,
        }
    }

    pub fn form_index(&self, module: &str) -> Option<usize> {
        self.forms.iter().position(|f| f.module.as_str() == module)
    }

    /// Returns `None` when the form has nothing selected; the warning is
    /// rendered and no request must be sent.
    pub fn begin_submission(&mut self, index: usize) -> Option<PendingUpload> {
        let form = self.forms.get_mut(index)?;
        if form.selected.is_empty() {
            form.result = ResultPanel::NoFiles;
            return None;
        }

        let submission = self.next_submission;
        self.next_submission += 1;

        let files = form.selected.clone();
        form.result = ResultPanel::processing(&form.module, files.len());
        form.in_flight += 1;
        self.overlays
            .open(submission, presentation::overlay_description(&form.module, &files));

        tracing::info!(
            module = %form.module,
            submission,
            files = files.len(),
            "submitting to /upload/{}",
            form.module
        );
        Some(PendingUpload {
            submission,
            form: index,
            module: form.module.clone(),
            files,
        })
    }

    pub fn finish(
        &mut self,
        submission: SubmissionId,
        index: usize,
        result: Result<AnalysisResponse, UploadError>,
        now: Instant,
    ) {
        let Some(form) = self.forms.get_mut(index) else {
            tracing::warn!(index, "upload finished for unknown form");
            self.overlays.hide(submission);
            return;
        };
        form.in_flight = form.in_flight.saturating_sub(1);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(module = %form.module, submission, error = %e, "upload failed");
                form.result = ResultPanel::upload_failed(&e);
                self.overlays.hide(submission);
                return;
            }
        };
        tracing::info!(module = %form.module, submission, ?response, "analysis response");

        if let Some(overlay) = self.overlays.get_mut(submission) {
            overlay.set_progress(
                RESPONSE_PROGRESS,
                presentation::response_progress_label(&response),
            );
        }

        form.result = ResultPanel::from_response(&response);
        if response.is_failure() {
            if let Some(overlay) = self.overlays.get_mut(submission) {
                overlay.description = "Analysis failed".to_string();
            }
            self.overlays.hide(submission);
            return;
        }

        form.clear_selection();

        let score = response.score_value();
        if let Some(overlay) = self.overlays.get_mut(submission) {
            overlay.description = presentation::done_description(&response);
            overlay.set_progress(
                (score / 100.0) as f32,
                format!("{}%", presentation::format_score(score)),
            );
        }
        self.overlays.hide_after(submission, now, self.hide_delay);
    }

    pub fn prune_overlays(&mut self, now: Instant) {
        self.overlays.prune(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::presentation::{Tone, NO_FILES_TEXT};
    use crate::config::default_modules;
    use reqwest::header::HeaderMap;
    use std::path::PathBuf;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DELAY: Duration = Duration::from_millis(1800);

    fn controller() -> FormController {
        FormController::init(&default_modules(), DELAY)
    }

    fn file(name: &str) -> SelectedFile {
        SelectedFile {
            name: name.to_string(),
            path: PathBuf::from(name),
            size: 1,
        }
    }

    fn response(json: &str) -> AnalysisResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn init_builds_one_form_per_module() {
        let c = controller();
        assert_eq!(c.forms.len(), 3);
        assert_eq!(c.form_index("image"), Some(2));
        assert_eq!(c.form_index("audio"), None);
    }

    #[test]
    fn zero_files_warns_without_request() {
        let mut c = controller();
        assert!(c.begin_submission(0).is_none());
        assert_eq!(c.forms[0].result, ResultPanel::NoFiles);
        assert_eq!(c.forms[0].result.lines(), vec![NO_FILES_TEXT]);
        assert!(c.overlays.is_empty());
        assert_eq!(c.forms[0].in_flight, 0);
    }

    #[test]
    fn submission_shows_processing_and_overlay() {
        let mut c = controller();
        c.forms[2].set_selection(vec![file("a.png"), file("b.png")]);
        let pending = c.begin_submission(2).unwrap();

        assert_eq!(pending.module.as_str(), "image");
        assert_eq!(pending.files.len(), 2);
        assert_eq!(c.forms[2].result, ResultPanel::processing(&ModuleId::new("image"), 2));
        let overlay = c.overlays.get(pending.submission).unwrap();
        assert_eq!(overlay.description, "Module: IMAGE — Files: 2 (a.png, b.png)");
        assert_eq!(overlay.progress, 0.10);
        assert_eq!(overlay.progress_label, "Starting...");
    }

    #[test]
    fn running_hint_tracks_outstanding_submissions() {
        let mut c = controller();
        c.forms[0].set_selection(vec![file("a.pdf")]);
        let first = c.begin_submission(0).unwrap();
        let second = c.begin_submission(0).unwrap();
        assert_eq!(c.forms[0].running_hint().as_deref(), Some("2 analyses running"));

        c.finish(
            first.submission,
            0,
            Err(UploadError::NoFiles),
            Instant::now(),
        );
        assert_eq!(c.forms[0].running_hint().as_deref(), Some("1 analysis running"));
        c.finish(
            second.submission,
            0,
            Err(UploadError::NoFiles),
            Instant::now(),
        );
        assert_eq!(c.forms[0].running_hint(), None);
    }

    #[test]
    fn success_clears_selection_and_delays_overlay_hide() {
        let mut c = controller();
        c.forms[1].set_selection(vec![file("essay.txt")]);
        let pending = c.begin_submission(1).unwrap();
        let now = Instant::now();
        c.finish(
            pending.submission,
            1,
            Ok(response(
                r#"{"status":"ok","result":"AI GENERATED","score":85,"files":2,"message":"x"}"#,
            )),
            now,
        );

        let form = &c.forms[1];
        assert!(form.selected.is_empty());
        assert_eq!(form.result.tone(), Tone::Success);
        assert!(form.result.lines()[0].starts_with("🤖"));

        let overlay = c.overlays.get(pending.submission).unwrap();
        assert_eq!(overlay.description, "Done — AI GENERATED (85%)");
        assert_eq!(overlay.progress_label, "85%");
        assert_eq!(overlay.hide_at, Some(now + DELAY));

        c.prune_overlays(now + Duration::from_millis(500));
        assert!(c.overlays.get(pending.submission).is_some());
        c.prune_overlays(now + DELAY);
        assert!(c.overlays.is_empty());
    }

    #[test]
    fn server_failure_hides_overlay_immediately_and_keeps_selection() {
        let mut c = controller();
        c.forms[0].set_selection(vec![file("a.pdf")]);
        let pending = c.begin_submission(0).unwrap();
        c.finish(
            pending.submission,
            0,
            Ok(response(r#"{"status":"failed","error":"bad file"}"#)),
            Instant::now(),
        );

        assert_eq!(
            c.forms[0].result,
            ResultPanel::AnalysisFailed {
                message: "bad file".to_string()
            }
        );
        assert_eq!(c.forms[0].result.score_bar(), None);
        assert_eq!(c.forms[0].selected.len(), 1);
        assert!(c.overlays.is_empty());
    }

    #[test]
    fn concurrent_submissions_do_not_share_overlays() {
        let mut c = controller();
        c.forms[0].set_selection(vec![file("a.pdf")]);
        c.forms[2].set_selection(vec![file("b.png")]);
        let first = c.begin_submission(0).unwrap();
        let second = c.begin_submission(2).unwrap();
        assert_ne!(first.submission, second.submission);
        assert_eq!(c.overlays.len(), 2);

        c.finish(
            second.submission,
            2,
            Ok(response(r#"{"result":"REAL","score":30,"files":1,"message":"m"}"#)),
            Instant::now(),
        );
        let untouched = c.overlays.get(first.submission).unwrap();
        assert!(untouched.description.starts_with("Module: DUPLICATE"));
        assert_eq!(untouched.progress, 0.10);
        assert_eq!(c.forms[0].result, ResultPanel::processing(&ModuleId::new("duplicate"), 1));
        assert_eq!(c.forms[2].result.tone(), Tone::Danger);
    }

    #[tokio::test]
    async fn network_failure_shows_error_text_and_hides_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essay.txt");
        std::fs::write(&path, "text").unwrap();

        // Bind and drop a listener so the port is closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client =
            SentinelClient::new(&format!("http://127.0.0.1:{}", port), HeaderMap::new(), None)
                .unwrap();

        let mut c = controller();
        c.forms[1].set_selection(vec![SelectedFile::from_path(&path).unwrap()]);
        let pending = c.begin_submission(1).unwrap();
        let WorkerEvent::UploadFinished {
            submission,
            form,
            result,
        } = pending.run(client).await
        else {
            panic!("expected upload event");
        };
        let error_text = result.as_ref().unwrap_err().to_string();
        c.finish(submission, form, result, Instant::now());

        let lines = c.forms[1].result.lines();
        assert_eq!(lines[0], "❌ Upload Failed");
        assert_eq!(lines[2], error_text);
        assert!(c.overlays.is_empty());
        assert_eq!(c.forms[1].selected.len(), 1);
    }

    #[tokio::test]
    async fn end_to_end_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/duplicate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "result": "ALL_UNIQUE",
                "score": 100,
                "files": 2,
                "message": "No duplicates"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for name in ["a.txt", "b.txt"] {
            let p = dir.path().join(name);
            std::fs::write(&p, name).unwrap();
            files.push(SelectedFile::from_path(p).unwrap());
        }

        let client = SentinelClient::new(&server.uri(), HeaderMap::new(), None).unwrap();
        let mut c = controller();
        c.forms[0].set_selection(files);
        let pending = c.begin_submission(0).unwrap();
        let WorkerEvent::UploadFinished {
            submission,
            form,
            result,
        } = pending.run(client).await
        else {
            panic!("expected upload event");
        };
        c.finish(submission, form, result, Instant::now());

        assert_eq!(c.forms[0].result.lines()[0], "✓ ALL_UNIQUE");
        assert!(c.forms[0].selected.is_empty());
    }
}
