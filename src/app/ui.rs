use super::presentation::{format_score, ResultPanel, Tone, EMAIL_NOTICE};
use super::state::{Overlay, Tab, UploadForm};
use super::SentinelApp;
use crate::config::ThemeConfig;
use crate::utils::color::themed;
use crate::utils::file_size::format_size;
use eframe::egui::{self, Align, Align2, Color32, RichText, Stroke};

enum UiAction {
    PickFiles(usize),
    AddFolder(usize),
    ClearFiles(usize),
    Submit(usize),
    RefreshUsers,
    ToggleBlock(usize),
    ImportSession,
    OpenDashboard,
}

fn tone_color(theme: &ThemeConfig, tone: Tone) -> Color32 {
    match tone {
        Tone::Info => themed(&theme.info, Color32::LIGHT_BLUE),
        Tone::Success => themed(&theme.success, Color32::from_rgb(0, 180, 0)),
        Tone::Warning => themed(&theme.warning, Color32::YELLOW),
        Tone::Danger => themed(&theme.danger, Color32::from_rgb(220, 50, 50)),
    }
}

impl SentinelApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();

        egui::TopBottomPanel::top("nav").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("SentinAI Uploader");
                ui.add_space(16.0);
                ui.selectable_value(&mut self.tab, Tab::Analyze, "🔍 Analyze");
                ui.selectable_value(&mut self.tab, Tab::Admin, "🛡 Admin");
                ui.selectable_value(&mut self.tab, Tab::Session, "🔑 Session");
                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("🌐 Open dashboard").clicked() {
                        actions.push(UiAction::OpenDashboard);
                    }
                });
            });
            ui.add_space(6.0);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("Server: {}", self.client.base_url()))
                        .color(ui.visuals().text_color().gamma_multiply(0.7)),
                );
                let running = self.controller.overlays.len();
                if running > 0 {
                    ui.separator();
                    ui.label(format!("{} analysis running", running));
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.tab {
                Tab::Analyze => self.render_forms(ui, &mut actions),
                Tab::Admin => self.render_admin(ui, &mut actions),
                Tab::Session => self.render_session(ui, &mut actions),
            });
        });

        self.render_overlays(ctx);

        if !actions.is_empty() {
            ctx.request_repaint();
        }
        for action in actions {
            match action {
                UiAction::PickFiles(i) => self.pick_files(i),
                UiAction::AddFolder(i) => self.add_folder(i),
                UiAction::ClearFiles(i) => self.clear_files(i),
                UiAction::Submit(i) => self.submit(ctx, i),
                UiAction::RefreshUsers => self.refresh_users(ctx),
                UiAction::ToggleBlock(i) => self.toggle_block(ctx, i),
                UiAction::ImportSession => self.import_session(),
                UiAction::OpenDashboard => self.open_dashboard(),
            }
        }
    }

    fn render_forms(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.add_space(10.0);
        for (index, form) in self.controller.forms.iter().enumerate() {
            ui.group(|ui| {
                ui.set_width(ui.available_width());
                render_form(ui, index, form, &self.config.theme, actions);
            });
            ui.add_space(12.0);
        }
    }

    fn render_admin(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.add_space(10.0);
        ui.horizontal(|ui| {
            let label = if self.admin.loading { "⏳ Loading..." } else { "🔄 Refresh users" };
            if ui.add_enabled(!self.admin.loading, egui::Button::new(label)).clicked() {
                actions.push(UiAction::RefreshUsers);
            }
            ui.label(format!(
                "Total: {}  •  Blocked: {}",
                self.admin.users.len(),
                self.admin.blocked_count()
            ));
        });

        if let Some(error) = &self.admin.load_error {
            ui.colored_label(tone_color(&self.config.theme, Tone::Danger), error);
        }
        ui.add_space(8.0);

        egui::Grid::new("users")
            .striped(true)
            .num_columns(6)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                for header in ["ID", "Name", "Email", "Role", "Last active", ""] {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();

                for (index, user) in self.admin.users.iter().enumerate() {
                    ui.label(user.id.to_string());
                    ui.label(user.name.as_deref().unwrap_or("-"));
                    ui.label(user.email.as_deref().unwrap_or("-"));
                    ui.label(user.role.as_deref().unwrap_or("-"));
                    ui.label(user.last_active.as_deref().unwrap_or("-"));
                    let enabled = !self.admin.is_pending(user);
                    if ui
                        .add_enabled(enabled, egui::Button::new(user.control_label()))
                        .clicked()
                    {
                        actions.push(UiAction::ToggleBlock(index));
                    }
                    ui.end_row();
                }
            });
    }

    fn render_session(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.add_space(10.0);
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Paste a request copied from a logged-in SentinAI tab");
                ui.label("ℹ").on_hover_text_at_pointer(
                    "To get the curl command:\n\
                    1. Log in to SentinAI in your browser\n\
                    2. Open Developer Tools (F12), Network tab\n\
                    3. Reload the dashboard\n\
                    4. Right-click the request and Copy as cURL",
                );
            });
            ui.add_space(8.0);
            ui.add_sized(
                [ui.available_width(), 150.0],
                egui::TextEdit::multiline(&mut self.curl_text)
                    .font(egui::TextStyle::Monospace)
                    .hint_text("curl 'http://127.0.0.1:5000/dashboard' -b 'session=...'"),
            );
            ui.add_space(8.0);
            let can_import = !self.curl_text.trim().is_empty();
            if ui
                .add_enabled(can_import, egui::Button::new("🔑 Use this session"))
                .clicked()
            {
                actions.push(UiAction::ImportSession);
            }
        });

        if let Some((ok, message)) = &self.session_message {
            let tone = if *ok { Tone::Success } else { Tone::Danger };
            ui.add_space(6.0);
            ui.colored_label(tone_color(&self.config.theme, tone), message);
        }
    }

    fn render_overlays(&self, ctx: &egui::Context) {
        if self.controller.overlays.is_empty() {
            return;
        }
        let accent = themed(&self.config.theme.accent, Color32::from_rgb(161, 89, 225));
        egui::Window::new("Processing")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(360.0);
                for overlay in self.controller.overlays.iter() {
                    render_overlay(ui, overlay, accent);
                    ui.add_space(8.0);
                }
            });
    }
}

fn render_form(
    ui: &mut egui::Ui,
    index: usize,
    form: &UploadForm,
    theme: &ThemeConfig,
    actions: &mut Vec<UiAction>,
) {
    let muted = ui.visuals().text_color().gamma_multiply(0.7);
    ui.horizontal(|ui| {
        ui.heading(&form.title);
        ui.label(RichText::new(form.module.as_str().to_uppercase()).small().color(muted));
    });
    if !form.description.is_empty() {
        ui.label(RichText::new(&form.description).color(muted));
    }
    ui.add_space(6.0);

    ui.horizontal(|ui| {
        let pick_label = if form.module.accepts_many() {
            "📁 Select files"
        } else {
            "📁 Select file"
        };
        if ui.button(pick_label).clicked() {
            actions.push(UiAction::PickFiles(index));
        }
        if form.module.accepts_many() && ui.button("📂 Add folder").clicked() {
            actions.push(UiAction::AddFolder(index));
        }
        if !form.selected.is_empty() && ui.button("✖ Clear").clicked() {
            actions.push(UiAction::ClearFiles(index));
        }
        let extensions = form.collector.extensions();
        if !extensions.is_empty() {
            ui.label(RichText::new(extensions.join(", ")).small().color(muted));
        }
    });

    if form.selected.is_empty() {
        ui.label(RichText::new("No file chosen").color(muted));
    } else {
        for file in &form.selected {
            ui.label(format!("• {} ({})", file.name, format_size(file.size)));
        }
        ui.label(
            RichText::new(format!(
                "{} file(s), {}",
                form.selected.len(),
                format_size(form.total_size())
            ))
            .small()
            .color(muted),
        );
    }

    ui.add_space(6.0);
    let button = egui::Button::new("🔍 Analyze").min_size(egui::vec2(140.0, 32.0));
    ui.horizontal(|ui| {
        if ui.add(button).clicked() {
            actions.push(UiAction::Submit(index));
        }
        if let Some(hint) = form.running_hint() {
            ui.spinner();
            ui.label(RichText::new(hint).small().color(muted));
        }
    });

    ui.add_space(6.0);
    render_result(ui, &form.result, theme);
}

fn render_result(ui: &mut egui::Ui, panel: &ResultPanel, theme: &ThemeConfig) {
    if matches!(panel, ResultPanel::Empty) {
        return;
    }
    let color = tone_color(theme, panel.tone());

    egui::Frame::group(ui.style())
        .stroke(Stroke::new(1.0, color))
        .fill(color.gamma_multiply(0.08))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            match panel {
                ResultPanel::Success(success) => {
                    ui.label(
                        RichText::new(format!("{} {}", success.icon, success.label))
                            .strong()
                            .size(16.0)
                            .color(color),
                    );
                    if let Some(score) = panel.score_bar() {
                        ui.add_space(6.0);
                        let fraction = (score / 100.0).clamp(0.0, 1.0) as f32;
                        ui.add(
                            egui::ProgressBar::new(fraction)
                                .text(format!("{}%", format_score(score)))
                                .fill(color),
                        );
                    }
                    ui.add_space(6.0);
                    ui.label(RichText::new(format!("Files analyzed: {}", success.files)).small());
                    ui.label(RichText::new(format!("Details: {}", success.details)).small());
                    ui.separator();
                    ui.label(RichText::new(EMAIL_NOTICE).small());
                }
                ResultPanel::Processing { .. } => {
                    let lines = panel.lines();
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(RichText::new(&lines[0]).strong());
                    });
                    for line in &lines[1..] {
                        ui.label(RichText::new(line).small());
                    }
                }
                _ => {
                    let lines = panel.lines();
                    if let Some((first, rest)) = lines.split_first() {
                        ui.label(RichText::new(first).strong().color(color));
                        for (i, line) in rest.iter().enumerate() {
                            let text = RichText::new(line);
                            // The last line of an upload failure is the raw error.
                            if i + 1 == rest.len() && rest.len() > 1 {
                                ui.label(text.small());
                            } else {
                                ui.label(text);
                            }
                        }
                    }
                }
            }
        });
}

fn render_overlay(ui: &mut egui::Ui, overlay: &Overlay, accent: Color32) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.vertical(|ui| {
            ui.label(RichText::new("Processing").strong().size(16.0));
            ui.label(&overlay.description);
        });
    });
    ui.add_space(6.0);
    ui.add(
        egui::ProgressBar::new(overlay.progress)
            .text(overlay.progress_label.as_str())
            .fill(accent),
    );
    ui.label(
        RichText::new("This may take a few seconds for the first run.")
            .small()
            .color(ui.visuals().text_color().gamma_multiply(0.7)),
    );
}
