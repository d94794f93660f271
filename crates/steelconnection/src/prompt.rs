// Interactive terminal prompts used while bootstrapping a connection.

use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Blocking line input, masked input, and user-facing notices.
///
/// Labels are passed without trailing punctuation; implementations decide how
/// to render them.
pub trait Prompter: Send {
    fn input(&mut self, label: &str) -> Result<String, Error>;

    /// Read a line without echoing it.
    fn password(&mut self, label: &str) -> Result<SecretString, Error>;

    fn notify(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&mut self, label: &str) -> Result<String, Error> {
        dialoguer::Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn password(&mut self, label: &str) -> Result<SecretString, Error> {
        rpassword::prompt_password(format!("{label}: "))
            .map(SecretString::from)
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

pub fn prompt_realm(prompter: &mut dyn Prompter) -> Result<String, Error> {
    prompter
        .input("Enter SteelConnect Manager fully qualified domain name")
        .map(|realm| realm.trim().to_owned())
}

pub fn prompt_username(prompter: &mut dyn Prompter) -> Result<String, Error> {
    prompter
        .input("Enter username")
        .map(|name| name.trim().to_owned())
}

/// Ask for a password twice until both non-empty entries match.
pub fn prompt_password(prompter: &mut dyn Prompter) -> Result<SecretString, Error> {
    loop {
        let password = prompter.password("Enter password")?;
        if password.expose_secret().is_empty() {
            continue;
        }
        let verify = prompter.password("Retype password")?;
        if password.expose_secret() == verify.expose_secret() {
            return Ok(password);
        }
        prompter.notify("Passwords do not match. Try again");
    }
}
