//! Release contributors.

use serde::{Deserialize, Serialize};

use super::lenient;

/// View-local identifier stamped on each contributor when the list is loaded.
///
/// Used only to tell list entries apart while editing; never sent back to
/// the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContributorKey(pub String);

impl ContributorKey {
    /// Generate a new random key
    pub fn new() -> Self {
        ContributorKey(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ContributorKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContributorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a contributor is a person or an organization.
///
/// Any other `type` string is kept as written so that editing it never
/// loses data; validation reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContributorKind {
    #[default]
    Person,
    Organization,
    Other(String),
}

impl From<String> for ContributorKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "person" => ContributorKind::Person,
            "organization" => ContributorKind::Organization,
            _ => ContributorKind::Other(raw),
        }
    }
}

impl From<ContributorKind> for String {
    fn from(kind: ContributorKind) -> Self {
        match kind {
            ContributorKind::Person => "person".to_string(),
            ContributorKind::Organization => "organization".to_string(),
            ContributorKind::Other(raw) => raw,
        }
    }
}

/// Site account linked to a contributor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedUser {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub institution_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub institution_url: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub profile_url: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub username: Option<String>,
}

/// One entry of a release's contributor list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contributor {
    /// View-local key, present once the list has been loaded into a store
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::or_default"
    )]
    pub key: Option<ContributorKey>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub user: Option<LinkedUser>,
    #[serde(deserialize_with = "lenient::string")]
    pub given_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub middle_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub family_name: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub affiliations: Vec<String>,
    #[serde(rename = "type", deserialize_with = "lenient::or_default")]
    pub kind: ContributorKind,
}

impl Contributor {
    /// Person contributor with the given names and no affiliation.
    pub fn person(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            given_name: given_name.into(),
            family_name: family_name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_unique() {
        assert_ne!(ContributorKey::new(), ContributorKey::new());
    }

    #[test]
    fn unkeyed_contributor_serializes_without_id() {
        let value = serde_json::to_value(Contributor::person("Ada", "Lovelace")).unwrap();
        assert!(value.get("_id").is_none());
        assert_eq!(value["type"], "person");
    }

    #[test]
    fn decodes_partial_entry() {
        let contributor: Contributor = serde_json::from_value(json!({
            "given_name": "Grace",
            "type": "organization",
            "user": null
        }))
        .unwrap();
        assert_eq!(contributor.kind, ContributorKind::Organization);
        assert!(contributor.user.is_none());
        assert!(contributor.affiliations.is_empty());
    }

    #[test]
    fn unknown_type_is_kept_verbatim() {
        let contributor: Contributor =
            serde_json::from_value(json!({"given_name": "R2", "type": "robot"})).unwrap();
        assert_eq!(contributor.kind, ContributorKind::Other("robot".to_string()));
        let value = serde_json::to_value(&contributor).unwrap();
        assert_eq!(value["type"], "robot");
    }

    #[test]
    fn null_fields_read_as_empty() {
        let contributor: Contributor = serde_json::from_value(json!({
            "given_name": "Ada",
            "middle_name": null,
            "affiliations": null,
            "type": null,
            "user": {"username": null, "name": "Ada L."}
        }))
        .unwrap();
        assert_eq!(contributor.middle_name, "");
        assert!(contributor.affiliations.is_empty());
        assert_eq!(contributor.kind, ContributorKind::Person);
        let user = contributor.user.unwrap();
        assert_eq!(user.username, None);
        assert_eq!(user.name.as_deref(), Some("Ada L."));
    }
}
