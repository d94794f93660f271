//! Controller and client information.

use serde_json::json;

use steelconnection::SConnect;
use steelconnection::client::connection::DEFAULT_API_VERSION;

use crate::cli::{GlobalOpts, VersionArgs};
use crate::commands::util::emit;
use crate::config;
use crate::error::CliError;

pub async fn version(sc: &mut SConnect, args: &VersionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let version = sc.scm_version().await?;
    emit(
        global,
        &json!({
            "realm": sc.realm(),
            "scm_version": version,
            "api_version": sc.api_version(),
        }),
    )?;
    if args.details && !global.quiet {
        eprintln!("{sc}");
    }
    Ok(())
}

/// Offline summary of the client build and configuration.
pub fn about(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    emit(
        global,
        &json!({
            "package": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "api_version": DEFAULT_API_VERSION,
            "config_path": config::config_path().display().to_string(),
            "profile": config::active_profile_name(global, &cfg),
        }),
    )
}
