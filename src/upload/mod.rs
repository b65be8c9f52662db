mod client;
mod error;
mod file_collector;
mod payload;
mod types;

pub use client::SentinelClient;
pub use error::UploadError;
pub use file_collector::FileCollector;
pub use types::{AnalysisResponse, BlockAction, ModuleId, SelectedFile, UserRecord};
