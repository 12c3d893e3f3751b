//! Releases and their parent codebase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::contributor::Contributor;
use super::lenient;

/// Peer review state of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    AwaitingReviewerFeedback,
    AwaitingEditorFeedback,
    AwaitingAuthorChanges,
    Complete,
}

/// Links driving the peer review workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewUrls {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub request_peer_review: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub review: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub notify_reviewers_of_changes: Option<String>,
}

/// Account that submitted a codebase or release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submitter {
    #[serde(deserialize_with = "lenient::string")]
    pub family_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub given_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
}

/// Parent record of a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Codebase {
    #[serde(deserialize_with = "lenient::string")]
    pub identifier: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub doi: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub live: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub has_published_changes: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub featured: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_replication: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub peer_reviewed: bool,
    #[serde(deserialize_with = "lenient::date")]
    pub first_published_on: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::date")]
    pub last_published_on: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub latest_version: Option<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub tags: Vec<Tag>,
    #[serde(deserialize_with = "lenient::string")]
    pub references_text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub associated_publications_text: String,
    pub relationships: serde_json::Value,
    #[serde(deserialize_with = "lenient::string")]
    pub repository_url: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub submitter: Submitter,
}

impl Default for Codebase {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            title: String::new(),
            description: String::new(),
            summary: String::new(),
            doi: None,
            live: false,
            has_published_changes: false,
            featured: false,
            is_replication: false,
            peer_reviewed: false,
            first_published_on: None,
            last_published_on: None,
            latest_version: None,
            keywords: Vec::new(),
            tags: Vec::new(),
            references_text: String::new(),
            associated_publications_text: String::new(),
            relationships: serde_json::json!({}),
            repository_url: String::new(),
            submitter: Submitter::default(),
        }
    }
}

/// The versioned record being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    #[serde(deserialize_with = "lenient::or_default")]
    pub codebase: Codebase,
    #[serde(deserialize_with = "lenient::string")]
    pub identifier: String,
    #[serde(deserialize_with = "lenient::string")]
    pub version_number: String,
    #[serde(deserialize_with = "lenient::string")]
    pub absolute_url: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub doi: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub license: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub possible_licenses: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub os: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub platforms: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub programming_languages: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub dependencies: Vec<serde_json::Value>,
    #[serde(deserialize_with = "lenient::string")]
    pub release_notes: String,
    #[serde(deserialize_with = "lenient::string")]
    pub documentation: String,
    /// Kept as entered so an unparseable date can still be shown and fixed.
    #[serde(deserialize_with = "lenient::opt_string")]
    pub embargo_end_date: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub live: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub peer_reviewed: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub review_status: Option<ReviewStatus>,
    #[serde(deserialize_with = "lenient::string")]
    pub submitted_package: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub submitter: Submitter,
    #[serde(deserialize_with = "lenient::list")]
    pub release_contributors: Vec<Contributor>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub urls: ReviewUrls,
}

/// Editable metadata subset of a release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDetail {
    #[serde(deserialize_with = "lenient::string")]
    pub documentation: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub embargo_end_date: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub os: String,
    #[serde(deserialize_with = "lenient::string")]
    pub license: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub live: bool,
    #[serde(deserialize_with = "lenient::strings")]
    pub platforms: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub programming_languages: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub release_notes: String,
}

impl Release {
    /// Embargo end as a date, `None` when unset or not a `YYYY-MM-DD` date.
    pub fn embargo_end(&self) -> Option<NaiveDate> {
        self.embargo_end_date.as_deref().and_then(lenient::parse_date)
    }
}

impl ReleaseDetail {
    pub fn embargo_end(&self) -> Option<NaiveDate> {
        self.embargo_end_date.as_deref().and_then(lenient::parse_date)
    }
}

/// The pair that addresses a release on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseIdentity {
    /// Codebase identifier
    pub identifier: String,
    pub version_number: String,
}

impl ReleaseIdentity {
    pub fn new(identifier: impl Into<String>, version_number: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            version_number: version_number.into(),
        }
    }
}

impl std::fmt::Display for ReleaseIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.identifier, self.version_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_release_has_empty_shape() {
        let value = serde_json::to_value(Release::default()).unwrap();
        assert_eq!(value["codebase"]["title"], "");
        assert_eq!(value["embargo_end_date"], serde_json::Value::Null);
        assert_eq!(value["review_status"], serde_json::Value::Null);
        assert_eq!(value["release_contributors"], json!([]));
        assert_eq!(value["urls"]["review"], serde_json::Value::Null);
    }

    #[test]
    fn partial_payload_decodes_with_defaults() {
        let release: Release = serde_json::from_value(json!({
            "version_number": "1.0.0",
            "embargo_end_date": "2030-05-01",
            "review_status": "awaiting_author_changes",
            "codebase": {"identifier": "abc123", "title": "Wolf Sheep"}
        }))
        .unwrap();
        assert_eq!(release.version_number, "1.0.0");
        assert_eq!(release.embargo_end_date.as_deref(), Some("2030-05-01"));
        assert_eq!(release.embargo_end(), NaiveDate::from_ymd_opt(2030, 5, 1));
        assert_eq!(release.review_status, Some(ReviewStatus::AwaitingAuthorChanges));
        assert_eq!(release.codebase.title, "Wolf Sheep");
        assert!(release.platforms.is_empty());
    }

    #[test]
    fn malformed_values_do_not_fail_the_view() {
        let release: Release = serde_json::from_value(json!({
            "embargo_end_date": "next tuesday",
            "review_status": "lost_in_review",
            "platforms": "netlogo",
            "live": null,
            "codebase": {"title": null, "tags": [{"name": "abm"}, 3]},
            "release_contributors": [null, {"given_name": "Ada", "type": "robot"}]
        }))
        .unwrap();
        assert_eq!(release.embargo_end_date.as_deref(), Some("next tuesday"));
        assert_eq!(release.embargo_end(), None);
        assert_eq!(release.review_status, None);
        assert!(release.platforms.is_empty());
        assert!(!release.live);
        assert_eq!(release.codebase.title, "");
        assert_eq!(release.codebase.tags.len(), 2);
        assert_eq!(release.release_contributors.len(), 2);
        assert_eq!(release.release_contributors[1].given_name, "Ada");
    }

    #[test]
    fn identity_display() {
        assert_eq!(ReleaseIdentity::new("abc123", "1.0").to_string(), "abc123@1.0");
    }
}
