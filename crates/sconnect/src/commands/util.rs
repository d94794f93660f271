//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::Value;

use steelconnection::Body;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Borrow owned `key=value` pairs as query parameters.
pub fn params(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Build a request body from `--data` or `--file`; nothing given means no
/// body.
pub fn read_body(data: Option<&str>, file: Option<&Path>) -> Result<Body, CliError> {
    let text = match (data, file) {
        (Some(data), _) => data.to_owned(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Ok(Body::Empty),
    };
    let value: Value = serde_json::from_str(&text)?;
    Ok(Body::Json(value))
}

/// Render and print a value per the global output options.
pub fn emit(global: &GlobalOpts, value: &Value) -> Result<(), CliError> {
    let rendered = output::render(&global.output, value)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn inline_data_wins_and_must_be_json() {
        assert_eq!(
            read_body(Some(r#"{"name":"Acme"}"#), None).unwrap(),
            Body::Json(json!({"name": "Acme"}))
        );
        assert!(matches!(read_body(Some("{oops"), None), Err(CliError::Json(_))));
        assert_eq!(read_body(None, None).unwrap(), Body::Empty);
    }

    #[test]
    fn body_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[1, 2]"#).unwrap();
        assert_eq!(read_body(None, Some(file.path())).unwrap(), Body::Json(json!([1, 2])));
    }
}
