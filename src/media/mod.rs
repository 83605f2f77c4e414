//! Media processing.
//!
//! The pipeline hands a downloaded file here with its target name;
//! processing embeds the user's metadata overrides (stream copy, no
//! re-encode) or falls back to a plain move when metadata is disabled.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Metadata the user wants written into the output container.
#[derive(Debug, Clone, Default)]
pub struct MetadataOverrides {
    pub enabled: bool,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl MetadataOverrides {
    fn is_effective(&self) -> bool {
        self.enabled && (self.title.is_some() || self.author.is_some())
    }
}

/// Transforms a local file into its deliverable form.
#[async_trait]
pub trait MediaProcessor: Send + Sync + 'static {
    /// Produce the output file for `target_name`, consuming `input`.
    async fn process(
        &self,
        input: &Path,
        target_name: &str,
        overrides: &MetadataOverrides,
    ) -> Result<PathBuf>;
}

/// ffmpeg-backed processor. Stream-copies, so even large files are fast.
pub struct FfmpegProcessor {
    work_dir: PathBuf,
    ffmpeg_bin: String,
}

impl FfmpegProcessor {
    pub fn new(work_dir: PathBuf, ffmpeg_bin: String) -> Self {
        Self {
            work_dir,
            ffmpeg_bin,
        }
    }

    fn output_path(&self, target_name: &str) -> PathBuf {
        self.work_dir.join(target_name)
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn process(
        &self,
        input: &Path,
        target_name: &str,
        overrides: &MetadataOverrides,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .context("creating media work directory")?;
        let output = self.output_path(target_name);

        if !overrides.is_effective() {
            // Rename is enough; fall back to copy across filesystems.
            if tokio::fs::rename(input, &output).await.is_err() {
                tokio::fs::copy(input, &output)
                    .await
                    .context("copying file to work directory")?;
                let _ = tokio::fs::remove_file(input).await;
            }
            return Ok(output);
        }

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-map")
            .arg("0")
            .arg("-c")
            .arg("copy");
        if let Some(title) = &overrides.title {
            cmd.arg("-metadata").arg(format!("title={title}"));
        }
        if let Some(author) = &overrides.author {
            cmd.arg("-metadata").arg(format!("artist={author}"));
        }
        cmd.arg(&output);

        debug!(input = %input.display(), output = %output.display(), "running ffmpeg");
        let result = cmd.output().await.context("spawning ffmpeg")?;

        let _ = tokio::fs::remove_file(input).await;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = tokio::fs::remove_file(&output).await;
            bail!("ffmpeg exited with {}: {}", result.status, tail);
        }

        Ok(output)
    }
}
