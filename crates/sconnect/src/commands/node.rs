//! Node commands: SSH tunnel and virtual image download.

use serde_json::json;

use steelconnection::{DownloadOptions, ImageProgress, SConnect};
use steelconnection::client::SilentProgress;

use crate::cli::{GlobalOpts, ImageArgs, TunnelArgs};
use crate::commands::util::emit;
use crate::error::CliError;
use crate::progress::Spinner;

pub async fn tunnel(sc: &mut SConnect, args: TunnelArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let record = sc.sshtunnel(&args.node_id, *args.timeout).await?;
    emit(global, &record)
}

pub async fn image(sc: &mut SConnect, args: ImageArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let options = DownloadOptions {
        save_as: args.save_as,
        build: args.build,
        quiet: global.quiet,
        poll_interval: *args.poll_interval,
        retries: args.retries,
        ..DownloadOptions::default()
    };

    let mut progress: Box<dyn ImageProgress> = if global.quiet {
        Box::new(SilentProgress)
    } else {
        Box::new(Spinner::new())
    };

    match sc
        .download_image_with(&args.node_id, &options, progress.as_mut())
        .await?
    {
        Some(download) => emit(
            global,
            &json!({
                "filename": download.path.display().to_string(),
                "filesize": download.filesize(),
                "bytes": download.bytes,
            }),
        ),
        None => Err(CliError::Validation {
            field: "image".into(),
            reason: sc
                .received()
                .unwrap_or_else(|| "download failed".into())
                .replace('\n', ", "),
        }),
    }
}
