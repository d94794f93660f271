//! Clap derive structures for the `sconnect` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use steelconnection::ErrorPolicy;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sconnect -- SteelConnect Manager from the command line
#[derive(Debug, Parser)]
#[command(
    name = "sconnect",
    version,
    about = "Query and configure a Riverbed SteelConnect Manager",
    long_about = "A thin CLI over the SteelConnect Manager REST API.\n\n\
        Resources are addressed relative to the config namespace\n\
        (e.g. `orgs`, `org/<id>/sites`); `status` reads the reporting namespace.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "SCONNECT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// SteelConnect Manager FQDN (overrides profile)
    #[arg(long, short = 'r', env = "SCONNECT_REALM", global = true)]
    pub realm: Option<String>,

    /// Username (the password is prompted for)
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Read credentials from netrc and never prompt
    #[arg(long, global = true)]
    pub netrc: bool,

    /// REST API version
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// What to do when the controller rejects a request
    #[arg(long, global = true, value_name = "raise|suppress|terminate")]
    pub on_error: Option<ErrorPolicy>,

    /// Interactive login attempts; 0 never prompts
    #[arg(long, global = true)]
    pub attempts: Option<u32>,

    /// Output format
    #[arg(long, short = 'o', env = "SCONNECT_OUTPUT", default_value = "json", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "SCONNECT_INSECURE", global = true)]
    pub insecure: bool,

    /// Connect timeout (e.g. "5s")
    #[arg(long, global = true)]
    pub connect_timeout: Option<humantime::Duration>,

    /// Read timeout (e.g. "60s", "2m")
    #[arg(long, global = true)]
    pub read_timeout: Option<humantime::Duration>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// One `id` (or scalar) per line
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// GET a config resource
    Get(GetArgs),

    /// GET a reporting (status) resource
    Status(ResourceArgs),

    /// POST a JSON body to a config resource
    Post(BodyArgs),

    /// PUT a JSON body to a config resource
    Put(BodyArgs),

    /// DELETE a config resource
    #[command(alias = "rm")]
    Delete(BodyArgs),

    /// Find objects by attribute
    #[command(alias = "find")]
    Lookup(LookupArgs),

    /// Open an SSH tunnel to a node and wait for it to connect
    Tunnel(TunnelArgs),

    /// Build and download a virtual appliance image
    Image(ImageArgs),

    /// Show the controller software version
    Version(VersionArgs),

    /// Show client and configuration details (offline)
    About,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Request commands ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ResourceArgs {
    /// Resource path, e.g. `orgs` or `org/<id>/sites`
    pub resource: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "param", short = 'P', value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub target: ResourceArgs,

    /// Write the raw response body to this file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct BodyArgs {
    #[command(flatten)]
    pub target: ResourceArgs,

    /// Inline JSON body
    #[arg(long, short = 'd', conflicts_with = "file")]
    pub data: Option<String>,

    /// Read the JSON body from a file
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

// ── Lookup ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LookupArgs {
    #[command(subcommand)]
    pub command: LookupCommand,
}

#[derive(Debug, Subcommand)]
pub enum LookupCommand {
    /// Organization by short name
    Org {
        name: String,
        /// Match on this field instead of `name`
        #[arg(long, default_value = "name")]
        key: String,
    },

    /// Node by serial number
    Node {
        serial: String,
        /// Match on this field instead of `serial`
        #[arg(long, default_value = "serial")]
        key: String,
    },

    /// Site by name within an organization
    Site {
        name: String,
        /// Organization id
        #[arg(long)]
        org: String,
        #[arg(long, default_value = "name")]
        key: String,
    },

    /// WAN by name within an organization
    Wan {
        name: String,
        /// Organization id
        #[arg(long)]
        org: String,
        #[arg(long, default_value = "name")]
        key: String,
    },

    /// Translate a model code name to its marketing name or back
    Model {
        #[arg(required_unless_present = "list")]
        value: Option<String>,

        /// Print every known code name and marketing name
        #[arg(long, conflicts_with = "value")]
        list: bool,
    },
}

// ── Node commands ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TunnelArgs {
    /// Node id
    pub node_id: String,

    /// How long to wait for the tunnel
    #[arg(long, default_value = "15s")]
    pub timeout: humantime::Duration,
}

#[derive(Debug, Args)]
pub struct ImageArgs {
    /// Node id
    pub node_id: String,

    /// Hypervisor type to build first (e.g. kvm, vmware, hyperv)
    #[arg(long, short = 'b')]
    pub build: Option<String>,

    /// File or directory to save to
    #[arg(long, short = 's')]
    pub save_as: Option<PathBuf>,

    /// Readiness checks before giving up
    #[arg(long, default_value_t = 600)]
    pub retries: u32,

    /// Pause between readiness checks
    #[arg(long, default_value = "1s")]
    pub poll_interval: humantime::Duration,
}

#[derive(Debug, Args)]
pub struct VersionArgs {
    /// Also print the connection summary
    #[arg(long)]
    pub details: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the loaded configuration
    Show,

    /// Store a profile password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },

    /// Store a username and password for a realm in the system keyring
    Login {
        /// Controller FQDN
        realm: String,

        /// Username (prompted for when omitted)
        #[arg(long, short = 'u')]
        username: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn key_value_params_parse() {
        assert_eq!(parse_key_val("a=b=c"), Ok(("a".into(), "b=c".into())));
        assert!(parse_key_val("novalue").is_err());
    }
}
