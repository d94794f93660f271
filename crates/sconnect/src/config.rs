//! CLI configuration: thin wrapper around `steelconnection_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--realm,
//! --username, --insecure, timeouts) on top of the active profile.

use steelconnection::{SConnect, SConnectBuilder, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use steelconnection_config::{
    Config, KeyringStore, Profile, ambient_store, config_path, load_config_or_default,
    profile_to_builder, profile_transport, store_password,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a connection builder from the config file, profile, and flags.
///
/// A profile named with `--profile` must exist. Without a matching profile
/// the builder starts from global defaults and ambient credentials.
pub fn resolve_builder(global: &GlobalOpts, cfg: &Config) -> Result<SConnectBuilder, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let profile = cfg.profiles.get(&profile_name);

    if profile.is_none() && global.profile.is_some() {
        let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if names.is_empty() {
                "(none)".into()
            } else {
                names.join(", ")
            },
        });
    }

    let fallback = Profile::default();
    // An explicit --realm never inherits the profile's credentials.
    let mut builder = match profile {
        Some(profile) if global.realm.is_none() => {
            profile_to_builder(profile, &profile_name, &cfg.defaults)?
        }
        _ => SConnect::builder()
            .on_error(cfg.defaults.on_error)
            .connection_attempts(cfg.defaults.connection_attempts)
            .credential_store(ambient_store()),
    };

    // Transport (flag > profile > defaults)
    let mut transport = profile_transport(profile.unwrap_or(&fallback), &cfg.defaults);
    if global.insecure {
        transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(ref connect) = global.connect_timeout {
        transport.connect_timeout = **connect;
    }
    if let Some(ref read) = global.read_timeout {
        transport.read_timeout = **read;
    }
    builder = builder.transport(transport);

    if let Some(ref realm) = global.realm {
        builder = builder.realm(realm);
    }
    if let Some(ref username) = global.username {
        builder = builder.username(username);
    }
    if global.netrc {
        builder = builder.use_netrc(true);
    }
    if let Some(ref version) = global.api_version {
        builder = builder.api_version(version);
    }
    if let Some(policy) = global.on_error {
        builder = builder.on_error(policy);
    }
    if let Some(attempts) = global.attempts {
        builder = builder.connection_attempts(attempts);
    }

    Ok(builder)
}
