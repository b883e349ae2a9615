use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub version: String,
    /// Bucket the source media is downloaded from.
    pub input_bucket: String,
    /// Bucket the encoded fragments are uploaded to.
    pub output_bucket: String,
    /// Local staging root shared by all stages.
    pub local_storage_path: String,
    /// Number of concurrent upload workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub toolkit: ToolkitConfig,
}

fn default_concurrency() -> usize {
    num_cpus::get()
}

impl EncoderConfig {
    pub fn local_storage_dir(&self) -> PathBuf {
        PathBuf::from(&self.local_storage_path)
    }
}

/// External binaries used by the fragment and transform stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolkitConfig {
    #[serde(default = "default_fragment_command")]
    pub fragment_command: String,
    #[serde(default = "default_package_command")]
    pub package_command: String,
}

fn default_fragment_command() -> String {
    "mp4fragment".to_string()
}

fn default_package_command() -> String {
    "mp4dash".to_string()
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            fragment_command: default_fragment_command(),
            package_command: default_package_command(),
        }
    }
}
