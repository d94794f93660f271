// Credential types and ambient credential stores.
//
// A connection resolves credentials in a fixed order: explicit arguments,
// then a `CredentialStore`, then interactive prompts. Stores never prompt.

use std::fmt;
use std::path::PathBuf;

use directories::BaseDirs;
use secrecy::SecretString;
use tracing::{debug, trace};
use url::Url;

/// Username and password sent as HTTP Basic auth.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A source of stored credentials, keyed by realm.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, realm: &str) -> Option<Credentials>;
}

/// Host part of a realm, whether or not it carries a scheme.
pub fn realm_host(realm: &str) -> String {
    if realm.contains("://") {
        if let Some(host) = Url::parse(realm).ok().and_then(|u| u.host_str().map(String::from)) {
            return host;
        }
    }
    realm
        .split(['/', ':'])
        .next()
        .unwrap_or(realm)
        .to_owned()
}

// ── No store ────────────────────────────────────────────────────────

/// Never yields credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStore;

impl CredentialStore for NoStore {
    fn lookup(&self, _realm: &str) -> Option<Credentials> {
        None
    }
}

// ── netrc ───────────────────────────────────────────────────────────

/// Credentials from a netrc file (`$NETRC`, else `~/.netrc`).
#[derive(Debug, Clone, Default)]
pub struct NetrcStore {
    path: Option<PathBuf>,
}

impl NetrcStore {
    /// Read the file at `path` instead of the default location.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os("NETRC") {
            return Some(PathBuf::from(path));
        }
        BaseDirs::new().map(|dirs| dirs.home_dir().join(".netrc"))
    }

    fn path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(Self::default_path)
    }
}

impl CredentialStore for NetrcStore {
    fn lookup(&self, realm: &str) -> Option<Credentials> {
        let path = self.path()?;
        let contents = std::fs::read_to_string(&path).ok()?;
        let host = realm_host(realm);
        let found = netrc_lookup(&contents, &host);
        debug!(path = %path.display(), host, found = found.is_some(), "netrc lookup");
        found
    }
}

#[derive(Debug, Default)]
struct NetrcEntry {
    machine: Option<String>,
    login: Option<String>,
    password: Option<String>,
}

fn parse_netrc(contents: &str) -> Vec<NetrcEntry> {
    let mut entries: Vec<NetrcEntry> = Vec::new();
    let mut in_macro = false;

    for line in contents.lines() {
        if in_macro {
            // A macro definition runs until the next blank line.
            in_macro = !line.trim().is_empty();
            continue;
        }
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "machine" => entries.push(NetrcEntry {
                    machine: tokens.next().map(String::from),
                    ..NetrcEntry::default()
                }),
                "default" => entries.push(NetrcEntry::default()),
                "login" | "password" | "account" => {
                    let value = tokens.next().map(String::from);
                    let Some(entry) = entries.last_mut() else {
                        continue;
                    };
                    match token {
                        "login" => entry.login = value,
                        "password" => entry.password = value,
                        _ => {}
                    }
                }
                "macdef" => {
                    in_macro = true;
                    break;
                }
                other if other.starts_with('#') => break,
                other => trace!(token = other, "ignoring netrc token"),
            }
        }
    }
    entries
}

fn netrc_lookup(contents: &str, host: &str) -> Option<Credentials> {
    let entries = parse_netrc(contents);
    let entry = entries
        .iter()
        .find(|e| e.machine.as_deref() == Some(host))
        .or_else(|| entries.iter().find(|e| e.machine.is_none()))?;
    let login = entry.login.clone()?;
    Some(Credentials::new(login, entry.password.clone().unwrap_or_default()))
}

// ── Environment ─────────────────────────────────────────────────────

/// Credentials from a pair of environment variables.
#[derive(Debug, Clone)]
pub struct EnvStore {
    username_var: String,
    password_var: String,
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new("SCONNECT_USERNAME", "SCONNECT_PASSWORD")
    }
}

impl EnvStore {
    pub fn new(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }
}

impl CredentialStore for EnvStore {
    fn lookup(&self, _realm: &str) -> Option<Credentials> {
        let username = std::env::var(&self.username_var).ok()?;
        let password = std::env::var(&self.password_var).ok()?;
        Some(Credentials::new(username, password))
    }
}

// ── Chain ───────────────────────────────────────────────────────────

/// Tries each store in order; the first hit wins.
#[derive(Default)]
pub struct StoreChain {
    stores: Vec<Box<dyn CredentialStore>>,
}

impl StoreChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, store: impl CredentialStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }
}

impl CredentialStore for StoreChain {
    fn lookup(&self, realm: &str) -> Option<Credentials> {
        self.stores.iter().find_map(|store| store.lookup(realm))
    }
}
