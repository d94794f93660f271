#![allow(clippy::unwrap_used)]
// Loading and saving profile configuration files.

use pretty_assertions::assert_eq;

use steelconnection::ErrorPolicy;
use steelconnection_config::{
    Config, Profile, load_config_from, resolve_password, save_config_to,
};

const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
output = "yaml"
on_error = "ignore"
read_timeout = 90

[profiles.lab]
realm = "lab.riverbed.cc"
username = "admin"
password = "plaintext"
connection_attempts = 1

[profiles.prod]
realm = "acme.riverbed.cc"
use_netrc = true
on_error = "raise"
"#;

#[test]
fn test_load_profiles_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let config = load_config_from(&path).unwrap();

    assert_eq!(config.default_profile.as_deref(), Some("lab"));
    assert_eq!(config.defaults.output, "yaml");
    assert_eq!(config.defaults.on_error, ErrorPolicy::Suppress);
    assert_eq!(config.defaults.read_timeout, 90);
    assert_eq!(config.defaults.connect_timeout, 5);

    let (name, lab) = config.profile(None).unwrap();
    assert_eq!(name, "lab");
    assert_eq!(lab.realm, "lab.riverbed.cc");
    assert_eq!(lab.connection_attempts, Some(1));

    let (_, prod) = config.profile(Some("prod")).unwrap();
    assert!(prod.use_netrc);
    assert_eq!(prod.on_error, Some(ErrorPolicy::Raise));
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.default_profile.as_deref(), Some("default"));
    assert!(config.profiles.is_empty());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.profiles.insert(
        "default".into(),
        Profile {
            realm: "acme.riverbed.cc".into(),
            username: Some("admin".into()),
            ..Profile::default()
        },
    );
    save_config_to(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let (_, profile) = loaded.profile(None).unwrap();
    assert_eq!(profile.username.as_deref(), Some("admin"));
}

#[test]
fn test_plaintext_password_is_last_resort() {
    let profile = Profile {
        realm: "lab.riverbed.cc".into(),
        password: Some("plaintext".into()),
        password_env: Some("SCONNECT_TEST_PASSWORD_THAT_IS_NEVER_SET".into()),
        ..Profile::default()
    };
    let password = resolve_password(&profile, "config-test-profile-without-keyring").unwrap();
    assert_eq!(secrecy::ExposeSecret::expose_secret(&password), "plaintext");
}
