// Find-by-attribute helpers over collection endpoints.

use serde_json::Value;

use crate::client::connection::SConnect;
use crate::error::Error;
use crate::models::translate_model;

/// Lookups scoped to one connection, obtained from [`SConnect::lookup`].
///
/// Matching is exact string equality on top-level fields. An object that
/// lacks a searched field never matches.
#[derive(Debug)]
pub struct LookUp<'a> {
    client: &'a mut SConnect,
}

impl SConnect {
    pub fn lookup(&mut self) -> LookUp<'_> {
        LookUp { client: self }
    }
}

impl LookUp<'_> {
    /// Every object in `domain` whose fields equal all `search` pairs, in
    /// server order.
    pub async fn find(&mut self, domain: &str, search: &[(&str, &str)]) -> Result<Vec<Value>, Error> {
        let collection = self.client.get(domain, &[]).await?;
        let Value::Array(items) = collection else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter(|item| matches_all(item, search))
            .collect())
    }

    /// First match, or `None`.
    pub async fn find_one(
        &mut self,
        domain: &str,
        search: &[(&str, &str)],
    ) -> Result<Option<Value>, Error> {
        Ok(self.find(domain, search).await?.into_iter().next())
    }

    /// Node by serial number; the serial is upper-cased first.
    pub async fn node(&mut self, serial: &str) -> Result<Option<Value>, Error> {
        self.node_by("serial", &serial.to_uppercase()).await
    }

    pub async fn node_by(&mut self, key: &str, value: &str) -> Result<Option<Value>, Error> {
        self.find_one("nodes", &[(key, value)]).await
    }

    /// Organization by short name.
    pub async fn org(&mut self, name: &str) -> Result<Option<Value>, Error> {
        self.org_by("name", name).await
    }

    pub async fn org_by(&mut self, key: &str, value: &str) -> Result<Option<Value>, Error> {
        self.find_one("orgs", &[(key, value)]).await
    }

    /// Site by name within an organization.
    pub async fn site(&mut self, name: &str, org_id: Option<&str>) -> Result<Option<Value>, Error> {
        self.site_by("name", name, org_id).await
    }

    pub async fn site_by(
        &mut self,
        key: &str,
        value: &str,
        org_id: Option<&str>,
    ) -> Result<Option<Value>, Error> {
        let org_id = require_org(org_id, "site")?;
        self.find_one(&format!("org/{org_id}/sites"), &[(key, value)])
            .await
    }

    /// WAN by name within an organization.
    pub async fn wan(&mut self, name: &str, org_id: Option<&str>) -> Result<Option<Value>, Error> {
        self.wan_by("name", name, org_id).await
    }

    pub async fn wan_by(
        &mut self,
        key: &str,
        value: &str,
        org_id: Option<&str>,
    ) -> Result<Option<Value>, Error> {
        let org_id = require_org(org_id, "wan")?;
        self.find_one(&format!("org/{org_id}/wans"), &[(key, value)])
            .await
    }

    /// Translate a model code name to its marketing name or back. Unknown
    /// values come back unchanged.
    pub fn model(&self, value: &str) -> String {
        translate_model(value).unwrap_or(value).to_owned()
    }
}

fn require_org<'a>(org_id: Option<&'a str>, kind: &str) -> Result<&'a str, Error> {
    org_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Validation(format!("orgid required when looking up a {kind}.")))
}

fn matches_all(item: &Value, search: &[(&str, &str)]) -> bool {
    search
        .iter()
        .all(|(key, value)| item.get(key).and_then(Value::as_str) == Some(*value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn matching_is_exact_and_missing_fields_never_match() {
        let item = json!({"name": "Acme", "city": "Boston", "size": 3});
        assert!(matches_all(&item, &[("name", "Acme")]));
        assert!(matches_all(&item, &[("name", "Acme"), ("city", "Boston")]));
        assert!(!matches_all(&item, &[("name", "acme")]));
        assert!(!matches_all(&item, &[("country", "US")]));
        assert!(!matches_all(&item, &[("size", "3")]));
        assert!(matches_all(&item, &[]));
    }

    #[test]
    fn org_id_is_required() {
        assert!(matches!(require_org(None, "site"), Err(Error::Validation(_))));
        assert!(matches!(require_org(Some(""), "wan"), Err(Error::Validation(_))));
        assert_eq!(require_org(Some("org-1"), "wan").ok(), Some("org-1"));
    }
}
