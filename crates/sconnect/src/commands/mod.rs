//! Command dispatch: bridges CLI args -> connection calls -> output formatting.

pub mod config_cmd;
pub mod lookup;
pub mod node;
pub mod request;
pub mod system;
pub mod util;

use steelconnection::SConnect;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, sc: &mut SConnect, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Get(args) => request::get(sc, args, global).await,
        Command::Status(args) => request::status(sc, &args, global).await,
        Command::Post(args) => request::post(sc, &args, global).await,
        Command::Put(args) => request::put(sc, &args, global).await,
        Command::Delete(args) => request::delete(sc, &args, global).await,
        Command::Lookup(args) => lookup::handle(sc, args, global).await,
        Command::Tunnel(args) => node::tunnel(sc, args, global).await,
        Command::Image(args) => node::image(sc, args, global).await,
        Command::Version(args) => system::version(sc, &args, global).await,
        // Offline commands are handled before a connection is made
        Command::About | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
