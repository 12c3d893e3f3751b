//! Rules for member profile documents.

use super::{Rule, Schema};

pub fn profile_schema() -> Schema {
    Schema::new(Rule::object([
        ("given_name", Rule::string().required()),
        ("family_name", Rule::string().required()),
        ("email", Rule::string().email().required()),
        ("research_interests", Rule::string()),
        ("orcid_url", Rule::string().url().nullable()),
        ("github_url", Rule::string().url().nullable()),
        ("personal_url", Rule::string().url()),
        ("professional_url", Rule::string().url()),
        ("institution_name", Rule::string().nullable()),
        ("institution_url", Rule::string().url().nullable()),
        ("bio", Rule::string()),
        ("degrees", Rule::array_of(Rule::string().required())),
        (
            "tags",
            Rule::array_of(Rule::object([("name", Rule::string().required())]).label("tag")),
        ),
        ("full_member", Rule::bool().required()),
    ]))
}
