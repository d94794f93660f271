//! Config subcommand handlers.

use dialoguer::Input;
use secrecy::SecretString;

use steelconnection::Credentials;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let mut rendered = toml::to_string_pretty(&redacted(cfg)).map_err(|e| {
                CliError::Validation {
                    field: "config".into(),
                    reason: format!("failed to serialize config: {e}"),
                }
            })?;
            if rendered.trim().is_empty() {
                rendered = "# empty configuration".into();
            }
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let password = rpassword::prompt_password(format!("Password for profile '{name}': "))?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            config::store_password(&name, &SecretString::from(password))?;
            if !global.quiet {
                eprintln!("Password stored in system keyring for profile '{name}'");
            }
            Ok(())
        }

        ConfigCommand::Login { realm, username } => {
            let username = match username {
                Some(username) => username,
                None => Input::new()
                    .with_prompt("Username")
                    .interact_text()
                    .map_err(prompt_err)?,
            };
            let password = rpassword::prompt_password(format!("Password for {username}@{realm}: "))?;
            if username.is_empty() || password.is_empty() {
                return Err(CliError::Validation {
                    field: "credentials".into(),
                    reason: "username and password cannot be empty".into(),
                });
            }
            config::KeyringStore::save(&realm, &Credentials::new(username, password))?;
            if !global.quiet {
                eprintln!("Credentials stored in system keyring for realm '{realm}'");
            }
            Ok(())
        }
    }
}

/// Map a dialoguer failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Mask plaintext passwords before display.
fn redacted(mut cfg: config::Config) -> config::Config {
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
    cfg
}
