// steelconnection: Async Rust client for the Riverbed SteelConnect Manager REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod policy;
pub mod prompt;
pub mod response;
pub mod transport;

pub use auth::{CredentialStore, Credentials, EnvStore, NetrcStore, NoStore, StoreChain};
pub use client::{Body, DownloadOptions, ImageProgress, LookUp, Namespace, SConnect, SConnectBuilder};
pub use error::Error;
pub use policy::ErrorPolicy;
pub use prompt::{Prompter, TerminalPrompter};
pub use response::Exchange;
pub use transport::{TlsMode, TransportConfig};
