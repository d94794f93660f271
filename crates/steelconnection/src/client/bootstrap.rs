// Realm and credential resolution
//
// Runs once inside `SConnectBuilder::connect`, before the error policy is
// installed, so every probe here sees typed errors.

use reqwest::Method;
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::auth::{CredentialStore, Credentials};
use crate::client::connection::{Body, Namespace, SConnect};
use crate::error::Error;
use crate::prompt::{Prompter, prompt_password, prompt_realm, prompt_username};

/// Everything the caller supplied up front.
pub(crate) struct Bootstrap {
    pub realm: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub use_netrc: bool,
    pub attempts: u32,
    pub store: Box<dyn CredentialStore>,
    pub prompter: Box<dyn Prompter>,
}

impl Bootstrap {
    fn explicit_credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

impl SConnect {
    pub(crate) async fn bootstrap(&mut self, mut boot: Bootstrap) -> Result<(), Error> {
        if boot.use_netrc {
            return self.use_stored_credentials(&boot);
        }

        if boot.attempts == 0 {
            let Some(realm) = boot.realm.take() else {
                return Err(Error::Validation(
                    "realm must be supplied when connection attempts is 0".into(),
                ));
            };
            self.realm = realm;
            self.credentials = boot
                .explicit_credentials()
                .or_else(|| boot.store.lookup(&self.realm));
            return Ok(());
        }

        if let Some(realm) = boot.realm.clone() {
            if let Some(credentials) = boot.explicit_credentials() {
                self.realm = realm;
                self.credentials = Some(credentials);
                return Ok(());
            }

            if boot.username.is_none() && boot.password.is_none() {
                self.realm = realm;
                self.credentials = boot.store.lookup(&self.realm);
                debug!(stored = self.credentials.is_some(), "probing realm with stored credentials");
                match self.probe().await {
                    Ok(()) => return Ok(()),
                    Err(Error::Authentication { .. }) => self.credentials = None,
                    Err(err) => return Err(err),
                }
            }
        }

        self.resolve_realm(&mut boot).await?;
        self.resolve_credentials(&mut boot).await
    }

    fn use_stored_credentials(&mut self, boot: &Bootstrap) -> Result<(), Error> {
        let Some(realm) = boot.realm.clone() else {
            return Err(Error::Validation("Must supply realm when using .netrc.".into()));
        };
        if boot.username.is_some() || boot.password.is_some() {
            return Err(Error::Validation(
                "Do not supply username or password when using .netrc.".into(),
            ));
        }
        self.realm = realm;
        self.credentials = boot.store.lookup(&self.realm);
        if self.credentials.is_none() {
            warn!(realm = %self.realm, "no stored credentials for realm");
        }
        Ok(())
    }

    /// Unauthenticated or authenticated reachability check.
    async fn probe(&mut self) -> Result<(), Error> {
        self.call(Method::GET, Namespace::Config, "orgs", &[], &Body::Empty)
            .await
            .map(|_| ())
    }

    async fn resolve_realm(&mut self, boot: &mut Bootstrap) -> Result<(), Error> {
        if let Some(realm) = boot.realm.clone() {
            self.realm = realm;
            return Ok(());
        }

        for _ in 0..boot.attempts {
            let realm = prompt_realm(boot.prompter.as_mut())?;
            self.realm.clone_from(&realm);
            match self.probe().await {
                // A 401 proves a controller answered.
                Ok(()) | Err(Error::Authentication { .. }) => return Ok(()),
                Err(err) if err.is_unreachable() => {
                    boot.prompter.notify(&format!("Error: {err}"));
                    boot.prompter.notify(&format!("Cannot connect to {realm}"));
                }
                Err(err @ Error::InvalidResource { .. }) => {
                    boot.prompter.notify(&format!("Error: {err}"));
                    boot.prompter
                        .notify(&format!("{realm} is not a SteelConnect Manager."));
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::Connection(
            "Could not connect to SteelConnect Manager.".into(),
        ))
    }

    async fn resolve_credentials(&mut self, boot: &mut Bootstrap) -> Result<(), Error> {
        if let Some(credentials) = boot.explicit_credentials() {
            self.credentials = Some(credentials);
            return Ok(());
        }

        for _ in 0..boot.attempts {
            let username = match &boot.username {
                Some(username) => username.clone(),
                None => prompt_username(boot.prompter.as_mut())?,
            };
            let password = match &boot.password {
                Some(password) => password.clone(),
                None => prompt_password(boot.prompter.as_mut())?,
            };
            self.credentials = Some(Credentials { username, password });

            match self.probe().await {
                Ok(()) => return Ok(()),
                Err(Error::Authentication { .. }) => {
                    boot.prompter.notify("Authentication Failed");
                }
                Err(err) => return Err(err),
            }
        }

        self.credentials = None;
        Err(Error::Connection(format!(
            "Failed to login to realm {}",
            self.realm
        )))
    }
}
