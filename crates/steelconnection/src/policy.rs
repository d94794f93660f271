// Per-connection error policy
//
// The policy is chosen once when a connection is built and resolved into a
// plain function that every request path calls on failure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Error;

/// What a connection does when the server answers with a non-2xx status.
///
/// Only server-status failures are subject to the policy. Transport errors
/// and local validation errors are always returned as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Return the typed error.
    #[default]
    Raise,
    /// Return `Ok({"error": "<diagnostic>"})` instead of an error.
    #[serde(alias = "ignore")]
    Suppress,
    /// Print the diagnostic to stderr and exit the process with status 1.
    #[serde(alias = "exit")]
    Terminate,
}

pub(crate) type FailureHandler = fn(Error) -> Result<Value, Error>;

impl ErrorPolicy {
    pub(crate) fn handler(self) -> FailureHandler {
        match self {
            Self::Raise => raise,
            Self::Suppress => suppress,
            Self::Terminate => terminate,
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raise => "raise",
            Self::Suppress => "suppress",
            Self::Terminate => "terminate",
        })
    }
}

impl FromStr for ErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raise" => Ok(Self::Raise),
            "suppress" | "ignore" => Ok(Self::Suppress),
            "terminate" | "exit" => Ok(Self::Terminate),
            other => Err(Error::Validation(format!(
                "unknown error policy '{other}', expected raise, suppress, or terminate"
            ))),
        }
    }
}

fn raise(err: Error) -> Result<Value, Error> {
    Err(err)
}

fn suppress(err: Error) -> Result<Value, Error> {
    match err.diagnostic() {
        Some(diagnostic) => Ok(json!({ "error": diagnostic })),
        None => Err(err),
    }
}

fn terminate(err: Error) -> Result<Value, Error> {
    if let Some(diagnostic) = err.diagnostic() {
        eprintln!("{diagnostic}");
        std::process::exit(1);
    }
    Err(err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn raise_passes_error_through() {
        let handler = ErrorPolicy::Raise.handler();
        let err = Error::from_status(404, "missing".into());
        assert!(matches!(handler(err), Err(Error::InvalidResource { .. })));
    }

    #[test]
    fn suppress_turns_api_errors_into_results() {
        let handler = ErrorPolicy::Suppress.handler();
        let value = handler(Error::from_status(400, "Status: 400".into())).unwrap();
        assert_eq!(value, json!({ "error": "Status: 400" }));
    }

    #[test]
    fn suppress_keeps_local_errors() {
        let handler = ErrorPolicy::Suppress.handler();
        let result = handler(Error::Validation("orgid required".into()));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("raise".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Raise);
        assert_eq!("EXIT".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Terminate);
        assert_eq!("ignore".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Suppress);
        assert!("explode".parse::<ErrorPolicy>().is_err());
        assert_eq!(ErrorPolicy::Terminate.to_string(), "terminate");
    }
}
