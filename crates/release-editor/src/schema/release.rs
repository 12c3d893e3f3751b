//! Rules for release documents.

use super::{Rule, Schema};

/// Contributor types accepted by the server.
pub const CONTRIBUTOR_TYPES: [&str; 2] = ["person", "organization"];

/// Rule for one entry of `release_contributors`.
pub fn contributor_rule() -> Rule {
    Rule::object([
        (
            "user",
            Rule::object([
                ("name", Rule::string()),
                ("institution_name", Rule::string()),
                ("institution_url", Rule::string()),
                ("profile_url", Rule::string()),
                ("username", Rule::string()),
            ])
            .nullable(),
        ),
        ("given_name", Rule::string().required()),
        ("middle_name", Rule::string()),
        ("family_name", Rule::string().required()),
        (
            "affiliations",
            Rule::array_of(Rule::string().label("affiliation")).min_items(1),
        ),
        ("type", Rule::mixed().one_of(CONTRIBUTOR_TYPES)),
    ])
    .label("contributor")
}

/// Schema for a whole release document.
pub fn release_schema() -> Schema {
    Schema::new(Rule::object([
        (
            "codebase",
            Rule::object([
                ("title", Rule::string().required()),
                ("description", Rule::string().required().min_len(20)),
                ("live", Rule::bool().label("is published?")),
                ("is_replication", Rule::bool()),
                (
                    "repository_url",
                    Rule::string()
                        .url_with_message("Not a valid url. URLs must start with http or https"),
                ),
            ])
            .required(),
        ),
        ("release_contributors", Rule::array_of(contributor_rule())),
        ("release_notes", Rule::string().required()),
        (
            "embargo_end_date",
            Rule::date().nullable().label("embargo end date"),
        ),
        ("os", Rule::string().required()),
        (
            "platforms",
            Rule::array_of(Rule::string().label("platform")),
        ),
        (
            "programming_languages",
            Rule::array_of(Rule::string().label("programming language")),
        ),
        ("live", Rule::bool()),
        ("license", Rule::string().required()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use serde_json::json;

    fn p(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn valid_release() -> serde_json::Value {
        json!({
            "codebase": {
                "title": "Wolf Sheep Predation",
                "description": "A classic predator prey model with grass regrowth.",
                "live": false,
                "is_replication": false,
                "repository_url": "https://github.com/comses/wolf-sheep"
            },
            "release_contributors": [{
                "user": null,
                "given_name": "Ada",
                "family_name": "Lovelace",
                "affiliations": ["Analytical Engine Society"],
                "type": "person"
            }],
            "release_notes": "Initial release",
            "embargo_end_date": null,
            "os": "platform_independent",
            "platforms": ["netlogo"],
            "programming_languages": ["NetLogo"],
            "live": false,
            "license": "MIT"
        })
    }

    #[test]
    fn valid_release_passes() {
        let tree = release_schema().validate_whole(&valid_release());
        assert!(tree.is_empty(), "unexpected errors: {:?}", tree);
    }

    #[test]
    fn contributor_requires_names_affiliation_and_known_type() {
        let mut release = valid_release();
        release["release_contributors"][0] = json!({
            "given_name": "",
            "affiliations": [],
            "type": "robot"
        });
        let tree = release_schema().validate_whole(&release);

        assert!(tree.get(&p("release_contributors[0].given_name")).is_some());
        assert!(tree.get(&p("release_contributors[0].family_name")).is_some());
        assert_eq!(
            tree.get(&p("release_contributors[0].affiliations")),
            Some(&["affiliations field must have at least 1 items".to_string()][..])
        );
        let kind_errors =
            ["type must be one of the following values: person, organization".to_string()];
        assert_eq!(
            tree.get(&p("release_contributors[0].type")),
            Some(&kind_errors[..])
        );
    }

    #[test]
    fn linked_user_is_independently_shaped() {
        let mut release = valid_release();
        release["release_contributors"][0]["user"] = json!({"username": 7});
        let tree = release_schema().validate_whole(&release);
        assert_eq!(
            tree.get(&p("release_contributors[0].user.username")),
            Some(&["username must be a `string` type".to_string()][..])
        );
    }

    #[test]
    fn codebase_description_and_url_constraints() {
        let mut release = valid_release();
        release["codebase"]["description"] = json!("too short");
        release["codebase"]["repository_url"] = json!("github.com/x");
        let tree = release_schema().validate_whole(&release);
        assert_eq!(
            tree.get(&p("codebase.description")),
            Some(&["description must be at least 20 characters".to_string()][..])
        );
        assert_eq!(
            tree.get(&p("codebase.repository_url")),
            Some(&["Not a valid url. URLs must start with http or https".to_string()][..])
        );
    }

    #[test]
    fn embargo_date_label_and_nullability() {
        let mut release = valid_release();
        release["embargo_end_date"] = json!("next tuesday");
        let tree = release_schema().validate_whole(&release);
        assert_eq!(
            tree.get(&p("embargo_end_date")),
            Some(&["embargo end date must be a `date` type".to_string()][..])
        );
    }

    #[test]
    fn missing_codebase_is_required() {
        let mut release = valid_release();
        release.as_object_mut().unwrap().remove("codebase");
        let tree = release_schema().validate_whole(&release);
        assert_eq!(
            tree.get(&p("codebase")),
            Some(&["codebase is a required field".to_string()][..])
        );
    }

    #[test]
    fn field_rules_resolve_for_store_paths() {
        let schema = release_schema();
        assert!(schema.rule_at(&p("codebase.title")).is_some());
        assert!(schema.rule_at(&p("release_contributors[2].given_name")).is_some());
        assert!(schema.rule_at(&p("platforms[0]")).is_some());
        assert!(schema.rule_at(&p("documentation")).is_none());
    }
}
