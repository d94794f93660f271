//! Shared configuration for SteelConnect tools.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to a `steelconnection::SConnectBuilder`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use steelconnection::auth::realm_host;
use steelconnection::{
    CredentialStore, Credentials, EnvStore, ErrorPolicy, NetrcStore, SConnect, SConnectBuilder,
    StoreChain, TlsMode, TransportConfig,
};

/// Keyring service name under which profile passwords are stored.
pub const KEYRING_SERVICE: &str = "steelconnection";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "SCONNECT_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Option<(&str, &Profile)> {
        let name = name.or(self.default_profile.as_deref())?;
        self.profiles
            .get_key_value(name)
            .map(|(name, profile)| (name.as_str(), profile))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// `json`, `json-compact`, `yaml`, or `plain`.
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub on_error: ErrorPolicy,

    /// Seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,

    #[serde(default = "default_attempts")]
    pub connection_attempts: u32,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            on_error: ErrorPolicy::default(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            connection_attempts: default_attempts(),
            insecure: false,
        }
    }
}

fn default_output() -> String {
    "json".into()
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_read_timeout() -> u64 {
    60
}
fn default_attempts() -> u32 {
    3
}

/// A named SteelConnect Manager profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller FQDN (e.g. "acme.riverbed.cc").
    pub realm: String,

    pub username: Option<String>,

    /// Plaintext password; prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Take credentials from netrc only.
    #[serde(default)]
    pub use_netrc: bool,

    pub api_version: Option<String>,
    pub on_error: Option<ErrorPolicy>,
    pub connect_timeout: Option<u64>,
    pub read_timeout: Option<u64>,
    pub connection_attempts: Option<u32>,
    pub insecure: Option<bool>,
    pub ca_cert: Option<PathBuf>,
    pub proxy: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$SCONNECT_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("cc", "riverbed", "sconnect").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("sconnect");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if present), then `SCONNECT_*` variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SCONNECT_").only(&["default_profile"]));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file is missing or invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML at `path`, creating parent directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Password resolution ─────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Resolve a profile's password: `password_env`, then the system keyring,
/// then the plaintext field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Named env var
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    profile
        .password
        .as_ref()
        .map(|pw| SecretString::from(pw.clone()))
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    Ok(())
}

// ── Keyring credential store ────────────────────────────────────────

/// Per-realm credentials kept in the system keyring under
/// `{host}/username` and `{host}/password`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    fn entry(realm: &str, field: &str) -> Result<keyring::Entry, ConfigError> {
        Ok(keyring::Entry::new(
            KEYRING_SERVICE,
            &format!("{}/{field}", realm_host(realm)),
        )?)
    }

    /// Save a username and password for `realm`.
    pub fn save(realm: &str, credentials: &Credentials) -> Result<(), ConfigError> {
        Self::entry(realm, "username")?.set_password(&credentials.username)?;
        Self::entry(realm, "password")?.set_password(credentials.password.expose_secret())?;
        debug!(realm, "stored realm credentials in keyring");
        Ok(())
    }
}

impl CredentialStore for KeyringStore {
    fn lookup(&self, realm: &str) -> Option<Credentials> {
        let username = Self::entry(realm, "username").ok()?.get_password().ok()?;
        let password = Self::entry(realm, "password").ok()?.get_password().ok()?;
        Some(Credentials::new(username, password))
    }
}

/// Stores consulted when no explicit credentials are given: environment,
/// keyring, then netrc.
pub fn ambient_store() -> StoreChain {
    StoreChain::new()
        .with(EnvStore::default())
        .with(KeyringStore)
        .with(NetrcStore::default())
}

// ── Builder translation ─────────────────────────────────────────────

/// Transport settings for a profile, with global defaults filling gaps.
pub fn profile_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        connect_timeout: Duration::from_secs(
            profile.connect_timeout.unwrap_or(defaults.connect_timeout),
        ),
        read_timeout: Duration::from_secs(profile.read_timeout.unwrap_or(defaults.read_timeout)),
        proxy: profile.proxy.clone(),
    }
}

/// Build an `SConnectBuilder` from a profile.
///
/// A resolvable password is handed over as an explicit credential; a bare
/// username leaves the password to the interactive prompt. Profiles without
/// a username fall back to [`ambient_store`].
pub fn profile_to_builder(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SConnectBuilder, ConfigError> {
    if profile.realm.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "realm".into(),
            reason: format!("profile '{profile_name}' has no realm"),
        });
    }

    let mut builder = SConnect::builder()
        .realm(profile.realm.trim())
        .use_netrc(profile.use_netrc)
        .on_error(profile.on_error.unwrap_or(defaults.on_error))
        .connection_attempts(
            profile
                .connection_attempts
                .unwrap_or(defaults.connection_attempts),
        )
        .transport(profile_transport(profile, defaults))
        .credential_store(ambient_store());

    if let Some(ref version) = profile.api_version {
        builder = builder.api_version(version);
    }

    if !profile.use_netrc {
        if let Some(ref username) = profile.username {
            builder = builder.username(username);
            if let Some(password) = resolve_password(profile, profile_name) {
                builder = builder.password(password.expose_secret());
            }
        }
    }

    Ok(builder)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_defaults() {
        let defaults = Defaults::default();
        assert_eq!(defaults.output, "json");
        assert_eq!(defaults.on_error, ErrorPolicy::Raise);
        assert_eq!(defaults.connection_attempts, 3);

        let transport = profile_transport(&Profile::default(), &defaults);
        let library = TransportConfig::default();
        assert_eq!(transport.connect_timeout, library.connect_timeout);
        assert_eq!(transport.read_timeout, library.read_timeout);
        assert!(matches!(transport.tls, TlsMode::System));
    }

    #[test]
    fn profile_overrides_transport() {
        let profile = Profile {
            realm: "acme.riverbed.cc".into(),
            ca_cert: Some("/etc/ssl/acme.pem".into()),
            read_timeout: Some(120),
            proxy: Some("http://proxy:3128".into()),
            ..Profile::default()
        };
        let transport = profile_transport(&profile, &Defaults::default());
        assert!(matches!(transport.tls, TlsMode::CustomCa(_)));
        assert_eq!(transport.read_timeout, Duration::from_secs(120));
        assert_eq!(transport.proxy.as_deref(), Some("http://proxy:3128"));

        let insecure = Profile {
            insecure: Some(true),
            ..profile
        };
        assert!(matches!(
            profile_transport(&insecure, &Defaults::default()).tls,
            TlsMode::DangerAcceptInvalid
        ));
    }

    #[test]
    fn empty_realm_is_rejected() {
        let err = profile_to_builder(&Profile::default(), "lab", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn builder_carries_profile_settings() {
        let profile = Profile {
            realm: " acme.riverbed.cc ".into(),
            api_version: Some("1.1".into()),
            on_error: Some(ErrorPolicy::Suppress),
            ..Profile::default()
        };
        let builder = profile_to_builder(&profile, "lab", &Defaults::default()).unwrap();
        let debug = format!("{builder:?}");
        assert!(debug.contains("\"acme.riverbed.cc\""));
        assert!(debug.contains("\"1.1\""));
        assert!(debug.contains("Suppress"));
    }

    #[test]
    fn profile_lookup_uses_default_name() {
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                realm: "acme.riverbed.cc".into(),
                ..Profile::default()
            },
        );
        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "default");
        assert_eq!(profile.realm, "acme.riverbed.cc");
        assert!(config.profile(Some("missing")).is_none());
    }
}
