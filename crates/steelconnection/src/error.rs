use thiserror::Error;

/// Top-level error type for the `steelconnection` crate.
///
/// Server-status failures (the first six variants) carry the diagnostic text
/// built from the last exchange. Everything else is either a local usage
/// problem or a transport failure and bypasses the connection's error policy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Server status ───────────────────────────────────────────────
    /// HTTP 400.
    #[error("Bad request\n{diagnostic}")]
    BadRequest { diagnostic: String },

    /// HTTP 401.
    #[error("Authentication failed\n{diagnostic}")]
    Authentication { diagnostic: String },

    /// HTTP 404: path or resource not found.
    #[error("Invalid resource\n{diagnostic}")]
    InvalidResource { diagnostic: String },

    /// HTTP 410.
    #[error("Resource gone\n{diagnostic}")]
    ResourceGone { diagnostic: String },

    /// HTTP 502: REST API not enabled on the controller.
    #[error("REST API not enabled\n{diagnostic}")]
    ApiNotEnabled { diagnostic: String },

    /// Any other non-2xx status.
    #[error("Request failed (HTTP {status})\n{diagnostic}")]
    Http { status: u16, diagnostic: String },

    // ── Local ───────────────────────────────────────────────────────
    /// Malformed arguments (missing org id, conflicting credential options).
    #[error("{0}")]
    Validation(String),

    /// Image workflow found nothing to download.
    #[error("{0}")]
    NoImage(String),

    /// A bounded wait ran out of attempts or time.
    #[error("{0}")]
    Timeout(String),

    /// Realm or credential bootstrap gave up.
    #[error("{0}")]
    Connection(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Filesystem error while saving a payload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal prompt could not be read.
    #[error("Prompt failed: {0}")]
    Prompt(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON decoding failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Map a non-2xx status code to its typed error.
    pub fn from_status(status: u16, diagnostic: String) -> Self {
        match status {
            400 => Self::BadRequest { diagnostic },
            401 => Self::Authentication { diagnostic },
            404 => Self::InvalidResource { diagnostic },
            410 => Self::ResourceGone { diagnostic },
            502 => Self::ApiNotEnabled { diagnostic },
            status => Self::Http { status, diagnostic },
        }
    }

    /// HTTP status of a server-status failure, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::Authentication { .. } => Some(401),
            Self::InvalidResource { .. } => Some(404),
            Self::ResourceGone { .. } => Some(410),
            Self::ApiNotEnabled { .. } => Some(502),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The diagnostic text of a server-status failure.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::BadRequest { diagnostic }
            | Self::Authentication { diagnostic }
            | Self::InvalidResource { diagnostic }
            | Self::ResourceGone { diagnostic }
            | Self::ApiNotEnabled { diagnostic }
            | Self::Http { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }

    /// Returns `true` if the server answered with a non-2xx status.
    pub fn is_api_error(&self) -> bool {
        self.status().is_some()
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::InvalidResource { .. })
    }

    /// Returns `true` when the server could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidUrl(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_typed_errors() {
        let cases = [
            (400, "BadRequest"),
            (401, "Authentication"),
            (404, "InvalidResource"),
            (410, "ResourceGone"),
            (502, "ApiNotEnabled"),
            (500, "Http"),
            (418, "Http"),
        ];
        for (code, name) in cases {
            let err = Error::from_status(code, "diag".into());
            assert_eq!(err.status(), Some(code));
            assert!(format!("{err:?}").starts_with(name), "{code} -> {err:?}");
            assert_eq!(err.diagnostic(), Some("diag"));
        }
    }

    #[test]
    fn local_errors_are_not_api_errors() {
        let err = Error::Validation("orgid required".into());
        assert!(!err.is_api_error());
        assert_eq!(err.diagnostic(), None);
        assert_eq!(err.to_string(), "orgid required");
    }
}
