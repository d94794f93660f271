// Controller version and SSH tunnel helpers.

use std::time::Duration;

use reqwest::Method;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::client::connection::{Body, Namespace, SConnect};
use crate::error::Error;
use crate::response::is_falsy;

pub const VERSION_UNAVAILABLE: &str = "unavailable";
pub const NOT_AN_SCM: &str = "Not a SteelConnect Manager";

const TUNNEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl SConnect {
    /// Controller software version as `{sw_version}_{sw_build}`.
    ///
    /// Fetched from the `common` namespace on first use and cached for the
    /// life of the connection.
    pub async fn scm_version(&mut self) -> Result<String, Error> {
        if let Some(version) = &self.scm_version {
            return Ok(version.clone());
        }

        let version = match self
            .call(Method::GET, Namespace::Common, "info", &[], &Body::Empty)
            .await
        {
            Ok(info) => describe_version(&info),
            Err(Error::InvalidResource { .. }) => VERSION_UNAVAILABLE.to_owned(),
            Err(err) => return Err(err),
        };
        debug!(version, "scm version");

        self.scm_version = Some(version.clone());
        Ok(version)
    }

    /// The cached version, without a network call.
    pub fn cached_scm_version(&self) -> Option<&str> {
        self.scm_version.as_deref()
    }

    /// Open (or look up) the SSH tunnel to a node and wait for it to connect.
    ///
    /// Returns `{"status": "offline"}` when the node is not online, otherwise
    /// the last tunnel record seen before it reported `connected` or the
    /// timeout elapsed. The error policy applies to the outcome as a whole.
    pub async fn sshtunnel(&mut self, node_id: &str, timeout: Duration) -> Result<Value, Error> {
        let outcome = self.open_tunnel(node_id, timeout).await;
        self.apply_policy(outcome)
    }

    async fn open_tunnel(&mut self, node_id: &str, timeout: Duration) -> Result<Value, Error> {
        let node = self
            .call(
                Method::GET,
                Namespace::Reporting,
                &format!("node/{node_id}"),
                &[],
                &Body::Empty,
            )
            .await?;
        if node.get("state").and_then(Value::as_str) != Some("online") {
            return Ok(json!({ "status": "offline" }));
        }

        let resource = format!("sshtunnel/{node_id}");
        let deadline = Instant::now() + timeout;
        let mut tunnel = json!({ "status": "unknown" });

        while Instant::now() < deadline && tunnel_status(&tunnel) != Some("connected") {
            tunnel = match self
                .call(Method::GET, Namespace::Config, &resource, &[], &Body::Empty)
                .await
            {
                Err(Error::InvalidResource { .. }) => {
                    self.call(Method::POST, Namespace::Config, &resource, &[], &Body::Empty)
                        .await?
                }
                other => other?,
            };
            debug!(node_id, status = ?tunnel_status(&tunnel), "ssh tunnel");
            sleep(TUNNEL_POLL_INTERVAL).await;
        }
        Ok(tunnel)
    }
}

fn tunnel_status(tunnel: &Value) -> Option<&str> {
    tunnel.get("status").and_then(Value::as_str)
}

fn describe_version(info: &Value) -> String {
    let (Some(version), Some(build)) = (info.get("sw_version"), info.get("sw_build")) else {
        return VERSION_UNAVAILABLE.to_owned();
    };
    if info.get("scm_id").is_none_or(is_falsy) {
        return NOT_AN_SCM.to_owned();
    }
    format!("{}_{}", scalar(version), scalar(build))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
