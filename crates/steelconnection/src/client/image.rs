// Virtual appliance image workflow: optional build request, readiness
// polling, then a streamed download to disk.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Method;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::client::connection::{Body, Namespace, SConnect};
use crate::error::Error;
use crate::models::{ImageDownload, ImageStatus};
use crate::response::is_falsy;

/// Emit a progress tick once per this many downloaded chunks.
const TICK_EVERY: usize = 50;

/// Knobs for [`SConnect::download_image`].
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// File or directory to write to. Defaults to the server's file name in
    /// the working directory.
    pub save_as: Option<PathBuf>,
    /// Hypervisor type to build before waiting (`kvm`, `vmware`, ...).
    pub build: Option<String>,
    /// Suppress progress output.
    pub quiet: bool,
    pub poll_interval: Duration,
    /// Readiness checks before giving up.
    pub retries: u32,
    /// Pause after a build request before the first readiness check.
    pub settle_delay: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            save_as: None,
            build: None,
            quiet: false,
            poll_interval: Duration::from_secs(1),
            retries: 600,
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// Receives human-facing progress from the image workflow.
pub trait ImageProgress: Send {
    fn message(&mut self, text: &str);
    /// One unit of work: a readiness check or a batch of chunks.
    fn tick(&mut self);
    fn finish(&mut self, text: &str) {
        self.message(text);
    }
}

/// Prints messages and dots to stdout.
#[derive(Debug, Default)]
pub struct PrintProgress {
    mid_line: bool,
}

impl ImageProgress for PrintProgress {
    fn message(&mut self, text: &str) {
        if std::mem::take(&mut self.mid_line) {
            println!();
        }
        println!("{text}");
    }

    fn tick(&mut self) {
        print!(".");
        let _ = std::io::stdout().flush();
        self.mid_line = true;
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ImageProgress for SilentProgress {
    fn message(&mut self, _text: &str) {}
    fn tick(&mut self) {}
}

impl SConnect {
    /// Download a node's virtual image, building it first when
    /// `options.build` is set.
    ///
    /// Returns `None` if the download request itself came back non-2xx.
    pub async fn download_image(
        &mut self,
        node_id: &str,
        options: &DownloadOptions,
    ) -> Result<Option<ImageDownload>, Error> {
        if options.quiet {
            self.download_image_with(node_id, options, &mut SilentProgress)
                .await
        } else {
            self.download_image_with(node_id, options, &mut PrintProgress::default())
                .await
        }
    }

    /// Same as [`download_image`](Self::download_image) with a caller-supplied
    /// progress sink; `options.quiet` is ignored.
    ///
    /// Controller errors along the way go through the error policy once; a
    /// suppressed error yields `None`.
    pub async fn download_image_with(
        &mut self,
        node_id: &str,
        options: &DownloadOptions,
        progress: &mut dyn ImageProgress,
    ) -> Result<Option<ImageDownload>, Error> {
        match self.fetch_image(node_id, options, progress).await {
            Err(err) if err.is_api_error() => (self.on_error)(err).map(|_| None),
            other => other,
        }
    }

    async fn fetch_image(
        &mut self,
        node_id: &str,
        options: &DownloadOptions,
        progress: &mut dyn ImageProgress,
    ) -> Result<Option<ImageDownload>, Error> {
        if let Some(build) = &options.build {
            self.prepare_image(node_id, build, options.settle_delay, progress)
                .await?;
        }

        let Some(status) = self.wait_for_image(node_id, options, progress).await? else {
            return Err(Error::NoImage(match &options.build {
                None => "'build' not specified and no image available.".into(),
                Some(build) => format!("no image available for build type '{build}'."),
            }));
        };

        progress.message(&format!(
            "Image file '{}' available for download.",
            status.image_file
        ));
        let destination = resolve_destination(&status.image_file, options.save_as.as_deref());
        let bytes = self
            .stream_image(node_id, &status.image_file, &destination, progress)
            .await?;

        if !self.is_ok() {
            return Ok(None);
        }
        info!(path = %destination.display(), bytes, "image downloaded");
        Ok(Some(ImageDownload {
            path: destination,
            bytes,
        }))
    }

    async fn prepare_image(
        &mut self,
        node_id: &str,
        build: &str,
        settle: Duration,
        progress: &mut dyn ImageProgress,
    ) -> Result<(), Error> {
        progress.message(&format!("Requesting image of type {build}"));
        self.call(
            Method::POST,
            Namespace::Config,
            &format!("node/{node_id}/prepare_image"),
            &[],
            &Body::Json(json!({ "type": build })),
        )
        .await?;
        // A readiness check right after the request reports failures without
        // their reason.
        sleep(settle).await;
        progress.message("Done.");
        Ok(())
    }

    /// Poll until the image is ready. `None` means the server reported that
    /// no image exists.
    async fn wait_for_image(
        &mut self,
        node_id: &str,
        options: &DownloadOptions,
        progress: &mut dyn ImageProgress,
    ) -> Result<Option<ImageStatus>, Error> {
        let resource = format!("node/{node_id}/image_status");
        for attempt in 0..options.retries {
            progress.tick();
            match self
                .call(Method::GET, Namespace::Config, &resource, &[], &Body::Empty)
                .await
            {
                Err(Error::ResourceGone { .. }) => return Ok(None),
                Err(err) => return Err(err),
                Ok(status) if status.get("status").is_some_and(|s| !is_falsy(s)) => {
                    return parse_status(status).map(Some);
                }
                Ok(_) => debug!(attempt, "image not ready"),
            }
            if attempt + 1 < options.retries {
                sleep(options.poll_interval).await;
            }
        }
        Err(Error::Timeout("Timed out waiting for image ready.".into()))
    }

    async fn stream_image(
        &mut self,
        node_id: &str,
        source_file: &str,
        destination: &Path,
        progress: &mut dyn ImageProgress,
    ) -> Result<u64, Error> {
        progress.message(&format!("Downloading file as '{}'", destination.display()));
        let mut file = tokio::fs::File::create(destination).await?;
        let mut chunks = self
            .stream(&format!("node/{node_id}/get_image"), &[("file", source_file)])
            .await?;

        let mut written: u64 = 0;
        let mut index = 0usize;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
            if index % TICK_EVERY == 0 {
                progress.tick();
            }
            index += 1;
        }
        file.flush().await?;

        progress.finish("Download complete.");
        Ok(written)
    }
}

fn parse_status(status: Value) -> Result<ImageStatus, Error> {
    let body = status.to_string();
    serde_json::from_value(status).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Where to write a downloaded file: the server name when nothing was
/// given, joined onto `save_as` when that is a directory, else `save_as`.
pub fn resolve_destination(source_file: &str, save_as: Option<&Path>) -> PathBuf {
    match save_as {
        None => PathBuf::from(source_file),
        Some(dir) if dir.is_dir() => dir.join(source_file),
        Some(path) => path.to_path_buf(),
    }
}
