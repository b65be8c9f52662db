mod app;
mod cli;
mod config;
mod logging;
mod upload;
mod utils;

use anyhow::Context;
use app::presentation::ResultPanel;
use app::{BlockRequest, FormController, SentinelApp, WorkerEvent};
use clap::Parser;
use cli::{Args, Command};
use config::{AppConfig, ModuleConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use upload::SentinelClient;

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(cookie) = args.cookie {
        config.cookie = Some(cookie);
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = Some(log_dir);
    }

    let _log_guard = logging::init_tracing(config.log_dir.as_deref())?;

    let headers = app::session_headers(config.cookie.as_deref())?;
    let client = SentinelClient::new(&config.base_url, headers, config.request_timeout())
        .context("failed to create HTTP client")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match args.command {
        None => {
            run_desktop(config, runtime, client)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Upload { module, files }) => {
            runtime.block_on(run_upload(&config, client, module, files))
        }
        Some(Command::Block { user_id, label }) => {
            runtime.block_on(run_block(client, user_id, label))
        }
        Some(Command::Users) => runtime.block_on(run_users(client)),
    }
}

fn run_desktop(
    config: AppConfig,
    runtime: tokio::runtime::Runtime,
    client: SentinelClient,
) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([760.0, 820.0])
            .with_min_inner_size([480.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SentinAI Uploader",
        options,
        Box::new(move |cc| Box::new(SentinelApp::new(cc, config, runtime, client))),
    )
    .map_err(|e| anyhow::anyhow!("failed to open window: {}", e))
}

async fn run_upload(
    config: &AppConfig,
    client: SentinelClient,
    module: String,
    paths: Vec<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let module = module.trim().to_string();
    config::validate_module_id(&module)?;

    let mut modules = config.modules.clone();
    if config.module(&module).is_none() {
        tracing::warn!(%module, "module not in configuration, uploading without file filter");
        modules.push(ModuleConfig {
            id: module.clone(),
            title: module.clone(),
            description: String::new(),
            accept: Vec::new(),
        });
    }

    let mut controller = FormController::init(&modules, config.overlay_hide_delay());
    let index = controller
        .form_index(&module)
        .with_context(|| format!("unknown module {}", module))?;

    let form = &mut controller.forms[index];
    let files = form.collector.select_paths(&paths);
    if files.len() < paths.len() {
        tracing::warn!(
            skipped = paths.len() - files.len(),
            "some paths were skipped (missing or not accepted by {})",
            module
        );
    }
    form.add_files(files);

    let Some(pending) = controller.begin_submission(index) else {
        print_panel(&controller.forms[index].result);
        return Ok(ExitCode::FAILURE);
    };
    print_panel(&controller.forms[index].result);

    if let WorkerEvent::UploadFinished {
        submission,
        form,
        result,
    } = pending.run(client).await
    {
        controller.finish(submission, form, result, Instant::now());
    }

    let panel = &controller.forms[index].result;
    print_panel(panel);
    Ok(if matches!(panel, ResultPanel::Success(_)) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_block(client: SentinelClient, user_id: String, label: String) -> anyhow::Result<ExitCode> {
    let request = BlockRequest::from_control(user_id, &label);
    let action = request.action;
    match request.run(client).await {
        WorkerEvent::BlockFinished {
            user_id,
            result: Ok(()),
        } => {
            println!("{} applied to user {}", action.as_str(), user_id);
            Ok(ExitCode::SUCCESS)
        }
        WorkerEvent::BlockFinished {
            user_id,
            result: Err(e),
        } => {
            tracing::warn!(%user_id, error = %e, "block action failed");
            Ok(ExitCode::FAILURE)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

async fn run_users(client: SentinelClient) -> anyhow::Result<ExitCode> {
    let users = client.list_users().await.context("failed to list users")?;
    for user in users {
        println!(
            "{:>4}  {:<24} {:<8} {}",
            user.id,
            user.email.as_deref().unwrap_or("-"),
            user.role.as_deref().unwrap_or("-"),
            if user.blocked { "blocked" } else { "active" }
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn print_panel(panel: &ResultPanel) {
    for line in panel.lines() {
        println!("{}", line);
    }
}
