mod admin;
mod controller;
pub mod presentation;
mod state;
mod ui;

use crate::config::AppConfig;
use crate::upload::{SentinelClient, UploadError};
use crate::utils::curl_parser::CurlParser;
use eframe::{egui, App};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use std::future::Future;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::time::Instant;
use tokio::runtime::Runtime;

use admin::AdminPanel;
use state::Tab;

pub use admin::BlockRequest;
pub use controller::FormController;
pub use state::WorkerEvent;

pub struct SentinelApp {
    config: AppConfig,
    runtime: Runtime,
    client: SentinelClient,
    controller: FormController,
    admin: AdminPanel,
    tab: Tab,
    curl_text: String,
    session_message: Option<(bool, String)>,
    events: std_mpsc::Sender<WorkerEvent>,
    event_receiver: std_mpsc::Receiver<WorkerEvent>,
}

pub fn session_headers(cookie: Option<&str>) -> Result<HeaderMap, UploadError> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) {
        let value = HeaderValue::from_str(cookie).map_err(|_| UploadError::InvalidCookie)?;
        headers.insert(COOKIE, value);
    }
    Ok(headers)
}

impl SentinelApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        runtime: Runtime,
        client: SentinelClient,
    ) -> Self {
        tracing::info!(base_url = %client.base_url(), "initializing SentinAI uploader");
        let controller = FormController::init(&config.modules, config.overlay_hide_delay());
        let (events, event_receiver) = std_mpsc::channel();
        Self {
            config,
            runtime,
            client,
            controller,
            admin: AdminPanel::default(),
            tab: Tab::default(),
            curl_text: String::new(),
            session_message: None,
            events,
            event_receiver,
        }
    }

    fn spawn<F>(&self, ctx: &egui::Context, task: F)
    where
        F: Future<Output = WorkerEvent> + Send + 'static,
    {
        let sender = self.events.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let event = task.await;
            let _ = sender.send(event);
            ctx.request_repaint();
        });
    }

    pub fn submit(&mut self, ctx: &egui::Context, index: usize) {
        if let Some(pending) = self.controller.begin_submission(index) {
            let client = self.client.clone();
            self.spawn(ctx, pending.run(client));
        }
    }

    pub fn pick_files(&mut self, index: usize) {
        let Some(form) = self.controller.forms.get_mut(index) else {
            return;
        };
        let mut dialog = rfd::FileDialog::new().set_title(&form.title);
        let extensions = form.collector.extensions();
        if !extensions.is_empty() {
            dialog = dialog.add_filter("Supported files", extensions.as_slice());
        }

        let picked: Vec<PathBuf> = if form.module.accepts_many() {
            dialog.pick_files().unwrap_or_default()
        } else {
            dialog.pick_file().into_iter().collect()
        };
        if picked.is_empty() {
            return;
        }
        let files = form.collector.select_paths(&picked);
        tracing::debug!(module = %form.module, picked = picked.len(), kept = files.len(), "files selected");
        form.set_selection(files);
    }

    pub fn add_folder(&mut self, index: usize) {
        let Some(form) = self.controller.forms.get_mut(index) else {
            return;
        };
        if let Some(folder) = rfd::FileDialog::new().pick_folder() {
            let files = form.collector.collect_folder(&folder);
            tracing::info!(module = %form.module, folder = %folder.display(), count = files.len(), "adding folder");
            form.add_files(files);
        }
    }

    pub fn clear_files(&mut self, index: usize) {
        if let Some(form) = self.controller.forms.get_mut(index) {
            form.clear_selection();
        }
    }

    pub fn refresh_users(&mut self, ctx: &egui::Context) {
        if self.admin.begin_load() {
            let client = self.client.clone();
            self.spawn(ctx, admin::load_users(client));
        }
    }

    pub fn toggle_block(&mut self, ctx: &egui::Context, user_index: usize) {
        let Some(user) = self.admin.users.get(user_index).cloned() else {
            return;
        };
        let request = self.admin.activate(&user);
        let client = self.client.clone();
        self.spawn(ctx, request.run(client));
    }

    pub fn import_session(&mut self) {
        let mut parser = CurlParser::new();
        if let Err(e) = parser.parse(&self.curl_text) {
            tracing::warn!(error = %e, "session import failed");
            self.session_message = Some((false, e));
            return;
        }
        let (Some(base_url), Some(headers)) = (parser.base_url, parser.headers) else {
            return;
        };

        match SentinelClient::new(&base_url, headers, self.config.request_timeout()) {
            Ok(client) => {
                tracing::info!(%base_url, "session imported");
                self.config.base_url = base_url.clone();
                self.client = client;
                self.admin = AdminPanel::default();
                self.session_message = Some((true, format!("Using session for {}", base_url)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "session import failed");
                self.session_message = Some((false, e.to_string()));
            }
        }
    }

    pub fn open_dashboard(&self) {
        match self.client.endpoint("dashboard") {
            Ok(url) => {
                if let Err(e) = open::that(url.as_str()) {
                    tracing::warn!(error = %e, "failed to open dashboard");
                }
            }
            Err(e) => tracing::warn!(error = %e, "invalid dashboard url"),
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let mut reload_users = false;

        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                WorkerEvent::UploadFinished {
                    submission,
                    form,
                    result,
                } => self.controller.finish(submission, form, result, now),
                WorkerEvent::BlockFinished { user_id, result } => {
                    reload_users |= self.admin.on_block_finished(&user_id, result);
                }
                WorkerEvent::UsersLoaded(result) => {
                    reload_users |= self.admin.on_users_loaded(result);
                }
            }
        }

        if reload_users || (self.tab == Tab::Admin && self.admin.needs_initial_load()) {
            self.refresh_users(ctx);
        }

        self.controller.prune_overlays(now);
        if let Some(deadline) = self.controller.overlays.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

impl App for SentinelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
