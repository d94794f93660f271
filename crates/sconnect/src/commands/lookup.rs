//! Lookup subcommands.

use serde_json::{Map, Value};

use steelconnection::SConnect;
use steelconnection::models::{model_table, translate_model};

use crate::cli::{GlobalOpts, LookupArgs, LookupCommand, OutputFormat};
use crate::commands::util::emit;
use crate::error::CliError;
use crate::output;

pub async fn handle(sc: &mut SConnect, args: LookupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut lookup = sc.lookup();
    let (found, resource_type, identifier, list_command) = match args.command {
        LookupCommand::Org { name, key } => {
            let found = lookup.org_by(&key, &name).await?;
            (found, "org", name, "orgs".to_owned())
        }
        LookupCommand::Node { serial, key } => {
            let found = if key == "serial" {
                lookup.node(&serial).await?
            } else {
                lookup.node_by(&key, &serial).await?
            };
            (found, "node", serial, "nodes".to_owned())
        }
        LookupCommand::Site { name, org, key } => {
            let found = lookup.site_by(&key, &name, Some(&org)).await?;
            (found, "site", name, format!("org/{org}/sites"))
        }
        LookupCommand::Wan { name, org, key } => {
            let found = lookup.wan_by(&key, &name, Some(&org)).await?;
            (found, "wan", name, format!("org/{org}/wans"))
        }
        LookupCommand::Model { value, list } => {
            return model(value.as_deref(), list, global);
        }
    };

    let Some(found) = found else {
        return Err(CliError::NotFound {
            resource_type: resource_type.into(),
            identifier,
            list_command,
        });
    };
    emit(global, &found)
}

/// Translate a model name, or list the whole table; needs no connection.
pub fn model(value: Option<&str>, list: bool, global: &GlobalOpts) -> Result<(), CliError> {
    if list {
        return match global.output {
            OutputFormat::Plain => {
                let lines: Vec<String> = model_table()
                    .iter()
                    .map(|(code, name)| format!("{code}\t{name}"))
                    .collect();
                output::print_output(&lines.join("\n"), global.quiet);
                Ok(())
            }
            _ => {
                let table: Map<String, Value> = model_table()
                    .iter()
                    .map(|&(code, name)| (code.to_owned(), Value::String(name.to_owned())))
                    .collect();
                emit(global, &Value::Object(table))
            }
        };
    }

    let Some(value) = value else {
        return Err(CliError::Validation {
            field: "value".into(),
            reason: "a model name or --list is required".into(),
        });
    };
    let translated = translate_model(value).unwrap_or(value);
    match global.output {
        OutputFormat::Plain => {
            output::print_output(translated, global.quiet);
            Ok(())
        }
        _ => emit(global, &Value::String(translated.to_owned())),
    }
}
