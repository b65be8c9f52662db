use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sentinai-uploader",
    version,
    about = "Desktop and command line client for SentinAI analysis modules"
)]
pub(crate) struct Args {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long)]
    pub(crate) base_url: Option<String>,
    /// Session cookie of a logged-in browser, e.g. `session=...`.
    #[arg(long)]
    pub(crate) cookie: Option<String>,
    #[arg(long)]
    pub(crate) log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Upload files to an analysis module and print the result.
    Upload {
        #[arg(long, short)]
        module: String,
        files: Vec<PathBuf>,
    },
    /// Block or unblock a user; the action is read from the button label.
    Block {
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value = "Block")]
        label: String,
    },
    /// List users with their block state.
    Users,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_desktop() {
        let args = Args::try_parse_from(["sentinai-uploader"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn parses_upload() {
        let args = Args::try_parse_from([
            "sentinai-uploader",
            "--base-url",
            "http://localhost:5000",
            "upload",
            "-m",
            "duplicate",
            "a.txt",
            "b.txt",
        ])
        .unwrap();
        assert_eq!(args.base_url.as_deref(), Some("http://localhost:5000"));
        match args.command {
            Some(Command::Upload { module, files }) => {
                assert_eq!(module, "duplicate");
                assert_eq!(files.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn block_label_defaults_to_block() {
        let args = Args::try_parse_from(["sentinai-uploader", "block", "--user-id", "4"]).unwrap();
        match args.command {
            Some(Command::Block { user_id, label }) => {
                assert_eq!(user_id, "4");
                assert_eq!(label, "Block");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
