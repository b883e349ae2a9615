use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use log::{debug, info};

use super::{MediaError, MediaStages};
use crate::config::{EncoderConfig, ToolkitConfig};
use crate::domain::Media;
use crate::storage::TransferStore;

/// `MediaStages` backed by a `TransferStore` for the download and by the
/// Bento4 command-line tools for fragmenting and DASH packaging.
///
/// Staging layout for a media with id `<id>`:
/// `<staging>/<id>.mp4` (source), `<staging>/<id>.frag` (fragmented) and
/// `<staging>/<id>/` (packaged output, later distributed).
pub struct ToolkitStages {
    store: Arc<dyn TransferStore>,
    input_bucket: String,
    staging_root: PathBuf,
    toolkit: ToolkitConfig,
}

impl ToolkitStages {
    pub fn new(
        store: Arc<dyn TransferStore>,
        input_bucket: impl Into<String>,
        staging_root: impl Into<PathBuf>,
        toolkit: ToolkitConfig,
    ) -> Self {
        Self {
            store,
            input_bucket: input_bucket.into(),
            staging_root: staging_root.into(),
            toolkit,
        }
    }

    pub fn from_config(config: &EncoderConfig, store: Arc<dyn TransferStore>) -> Self {
        Self::new(
            store,
            config.input_bucket.clone(),
            config.local_storage_dir(),
            config.toolkit.clone(),
        )
    }

    pub fn source_path(&self, media: &Media) -> PathBuf {
        media
            .local_path
            .clone()
            .unwrap_or_else(|| self.staging_root.join(format!("{}.mp4", media.id)))
    }

    pub fn fragment_path(&self, media: &Media) -> PathBuf {
        self.staging_root.join(format!("{}.frag", media.id))
    }

    pub fn output_dir(&self, media: &Media) -> PathBuf {
        self.staging_root.join(&media.id)
    }

    fn source_key(&self, media: &Media) -> String {
        let locator = media.resource_locator.trim_start_matches('/');
        let bucket = self.input_bucket.trim_end_matches('/');
        if bucket.is_empty() {
            locator.to_string()
        } else {
            format!("{}/{}", bucket, locator)
        }
    }

    fn run_tool<I, S>(&self, program: &str, args: I) -> Result<(), MediaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args);
        debug!("Running {:?}", cmd);

        let output = cmd.output().map_err(|e| MediaError::Command {
            program: program.to_string(),
            source: e,
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::ToolFailed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

fn remove_if_present(path: &Path) -> Result<(), MediaError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MediaError::io(path, e)),
    }
}

impl MediaStages for ToolkitStages {
    fn acquire(&self, media: &Media) -> Result<PathBuf, MediaError> {
        std::fs::create_dir_all(&self.staging_root)
            .map_err(|e| MediaError::io(&self.staging_root, e))?;

        let local_path = self.staging_root.join(format!("{}.mp4", media.id));
        self.store.get(&self.source_key(media), &local_path)?;

        info!("Media {} has been saved to {}", media.id, local_path.display());
        Ok(local_path)
    }

    fn fragment(&self, media: &Media) -> Result<(), MediaError> {
        let source = self.source_path(media);
        let fragmented = self.fragment_path(media);
        self.run_tool(
            &self.toolkit.fragment_command,
            [source.as_os_str(), fragmented.as_os_str()],
        )?;
        info!("Media {} fragmented", media.id);
        Ok(())
    }

    fn transform(&self, media: &Media) -> Result<(), MediaError> {
        let fragmented = self.fragment_path(media);
        let output = self.output_dir(media);
        self.run_tool(
            &self.toolkit.package_command,
            [
                fragmented.as_os_str(),
                OsStr::new("--use-segment-timeline"),
                OsStr::new("-o"),
                output.as_os_str(),
                OsStr::new("-f"),
            ],
        )?;
        info!("Media {} packaged into {}", media.id, output.display());
        Ok(())
    }

    fn finish(&self, media: &Media) -> Result<(), MediaError> {
        remove_if_present(&self.source_path(media))?;
        remove_if_present(&self.fragment_path(media))?;
        info!("Intermediate files for media {} removed", media.id);
        Ok(())
    }
}
