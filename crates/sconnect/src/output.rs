//! Output formatting: JSON, YAML, plain.

use std::io::{self, Write};

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a response value in the chosen format.
pub fn render(format: &OutputFormat, data: &Value) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?.trim_end().to_owned(),
        OutputFormat::Plain => render_plain(data),
    })
}

/// One line per item: its `id` if it has one, else the scalar itself.
fn render_plain(data: &Value) -> String {
    match data {
        Value::Array(items) => items.iter().map(plain_line).collect::<Vec<_>>().join("\n"),
        other => plain_line(other),
    }
}

fn plain_line(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(map) => map
            .get("id")
            .map_or_else(|| item.to_string(), plain_line),
        other => other.to_string(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_prints_ids_one_per_line() {
        let data = json!([{"id": "org-1", "name": "Acme"}, {"name": "no id"}, "bare"]);
        assert_eq!(
            render(&OutputFormat::Plain, &data).unwrap(),
            "org-1\n{\"name\":\"no id\"}\nbare"
        );
    }

    #[test]
    fn compact_and_yaml() {
        let data = json!({"status": "connected"});
        assert_eq!(
            render(&OutputFormat::JsonCompact, &data).unwrap(),
            r#"{"status":"connected"}"#
        );
        assert_eq!(render(&OutputFormat::Yaml, &data).unwrap(), "status: connected");
    }
}
