//! Declarative validation rules for edited documents.
//!
//! A [`Rule`] tree mirrors the shape of the document it validates. Each node
//! carries a presence requirement, nullability, a label used in messages, a
//! value kind (primitive, array of element rules, object of field rules) and
//! a list of format constraints. [`Schema`] wraps a root rule and resolves
//! the sub-rule that governs any document path.
//!
//! Evaluation is pure. [`validate_field`] is async so callers can treat it
//! like any other deferred check; it never leaves the process.

mod profile;
mod release;

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_tree::ErrorTree;
use crate::path::{Path, Segment};

pub use profile::profile_schema;
pub use release::{contributor_rule, release_schema};

/// Whether a value must be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    #[default]
    Optional,
}

/// Format constraint applied on top of a kind check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// String must have at least this many characters
    MinLength { min: usize },
    /// Non-empty string must be an http(s) URL
    Url { message: Option<String> },
    /// Non-empty string must look like an email address
    Email,
    /// Value must equal one of the listed values
    OneOf { values: Vec<Value> },
}

/// Value kind expected at a rule's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kind {
    String,
    Bool,
    Number,
    /// ISO date (`2024-01-31`) or RFC 3339 timestamp string
    Date,
    /// Any JSON value
    Mixed,
    Array {
        element: Option<Box<Rule>>,
        min_items: Option<usize>,
    },
    Object {
        fields: Vec<(String, Rule)>,
    },
}

impl Kind {
    fn type_name(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::Date => "date",
            Kind::Mixed => "mixed",
            Kind::Array { .. } => "array",
            Kind::Object { .. } => "object",
        }
    }
}

/// A node of the validation rule tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub presence: Presence,
    pub nullable: bool,
    pub label: Option<String>,
    pub kind: Kind,
    pub constraints: Vec<Constraint>,
}

/// A failed check at a document path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: Path,
    pub message: String,
}

impl Rule {
    fn of(kind: Kind) -> Self {
        Self {
            presence: Presence::Optional,
            nullable: false,
            label: None,
            kind,
            constraints: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(Kind::String)
    }

    pub fn bool() -> Self {
        Self::of(Kind::Bool)
    }

    pub fn number() -> Self {
        Self::of(Kind::Number)
    }

    pub fn date() -> Self {
        Self::of(Kind::Date)
    }

    pub fn mixed() -> Self {
        Self::of(Kind::Mixed)
    }

    /// Array whose elements must each satisfy `element`.
    pub fn array_of(element: Rule) -> Self {
        Self::of(Kind::Array {
            element: Some(Box::new(element)),
            min_items: None,
        })
    }

    /// Object with the given field rules. Unlabelled fields are labelled
    /// after their key, with underscores shown as spaces.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Rule)>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(key, mut rule)| {
                let key = key.into();
                if rule.label.is_none() {
                    rule.label = Some(key.replace('_', " "));
                }
                (key, rule)
            })
            .collect();
        Self::of(Kind::Object { fields })
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.constraints.push(Constraint::MinLength { min });
        self
    }

    pub fn url(mut self) -> Self {
        self.constraints.push(Constraint::Url { message: None });
        self
    }

    /// URL constraint reporting `message` instead of the default wording.
    pub fn url_with_message(mut self, message: impl Into<String>) -> Self {
        self.constraints.push(Constraint::Url {
            message: Some(message.into()),
        });
        self
    }

    pub fn email(mut self) -> Self {
        self.constraints.push(Constraint::Email);
        self
    }

    pub fn one_of<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.constraints.push(Constraint::OneOf {
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Minimum element count; only meaningful on array rules.
    pub fn min_items(mut self, min: usize) -> Self {
        if let Kind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(min);
        }
        self
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    /// Sub-rule for a direct child of this rule's value.
    pub fn child(&self, segment: &Segment) -> Option<&Rule> {
        match (&self.kind, segment) {
            (Kind::Object { fields }, Segment::Key(key)) => fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, rule)| rule),
            (Kind::Array { element, .. }, Segment::Index(_)) => element.as_deref(),
            _ => None,
        }
    }

    /// Evaluate this rule, returning every violation found below `path`.
    ///
    /// `value` is `None` when the member is absent from its parent.
    pub fn evaluate(&self, value: Option<&Value>, path: &Path) -> Vec<Violation> {
        let mut out = Vec::new();
        let label = self.label.as_deref().unwrap_or("this");
        self.check(value, path, label, &mut out);
        out
    }

    fn check(&self, value: Option<&Value>, path: &Path, label: &str, out: &mut Vec<Violation>) {
        let value = match value {
            None | Some(Value::Null) if self.is_required() => {
                fail(out, path, format!("{} is a required field", label));
                return;
            }
            None => return,
            Some(Value::Null) if self.nullable => return,
            Some(Value::Null) => {
                fail(out, path, format!("{} cannot be null", label));
                return;
            }
            Some(value) => value,
        };

        let type_ok = match &self.kind {
            Kind::String => value.is_string(),
            Kind::Bool => value.is_boolean(),
            Kind::Number => value.is_number(),
            Kind::Date => value.as_str().is_some_and(is_date),
            Kind::Mixed => true,
            Kind::Array { .. } => value.is_array(),
            Kind::Object { .. } => value.is_object(),
        };
        if !type_ok {
            let message = format!("{} must be a `{}` type", label, self.kind.type_name());
            fail(out, path, message);
            return;
        }

        if let Some(s) = value.as_str() {
            if self.is_required() && s.is_empty() {
                fail(out, path, format!("{} is a required field", label));
                return;
            }
        }

        for constraint in &self.constraints {
            if let Some(message) = check_constraint(constraint, value, label) {
                fail(out, path, message);
            }
        }

        match &self.kind {
            Kind::Array { element, min_items } => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
                if let Some(min) = min_items {
                    if items.len() < *min {
                        let message = format!("{} field must have at least {} items", label, min);
                        fail(out, path, message);
                    }
                }
                if let Some(element) = element {
                    for (i, item) in items.iter().enumerate() {
                        let item_label = element
                            .label
                            .clone()
                            .unwrap_or_else(|| format!("{}[{}]", label, i));
                        element.check(Some(item), &path.child(i), &item_label, out);
                    }
                }
            }
            Kind::Object { fields } => {
                for (key, rule) in fields {
                    let field_label = rule.label.as_deref().unwrap_or(key);
                    rule.check(value.get(key), &path.child(key.as_str()), field_label, out);
                }
            }
            _ => {}
        }
    }
}

fn fail(out: &mut Vec<Violation>, path: &Path, message: String) {
    out.push(Violation {
        path: path.clone(),
        message,
    });
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r"^(?i)https?://([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}(:\d+)?([/?#]\S*)?$")
            .expect("URL pattern is valid")
    })
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}

fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

fn check_constraint(constraint: &Constraint, value: &Value, label: &str) -> Option<String> {
    match constraint {
        Constraint::MinLength { min } => {
            let s = value.as_str()?;
            (s.chars().count() < *min)
                .then(|| format!("{} must be at least {} characters", label, min))
        }
        Constraint::Url { message } => {
            let s = value.as_str()?;
            (!s.is_empty() && !url_pattern().is_match(s)).then(|| {
                message
                    .clone()
                    .unwrap_or_else(|| format!("{} must be a valid URL", label))
            })
        }
        Constraint::Email => {
            let s = value.as_str()?;
            (!s.is_empty() && !email_pattern().is_match(s))
                .then(|| format!("{} must be a valid email", label))
        }
        Constraint::OneOf { values } => (!values.contains(value)).then(|| {
            let allowed: Vec<String> = values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            format!(
                "{} must be one of the following values: {}",
                label,
                allowed.join(", ")
            )
        }),
    }
}

/// Evaluate one sub-rule against one value.
///
/// Resolves to `Ok(())` when the value passes, or to every message produced,
/// in rule order.
pub async fn validate_field(rule: &Rule, value: &Value) -> Result<(), Vec<String>> {
    tokio::task::yield_now().await;
    let violations = rule.evaluate(Some(value), &Path::root());
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations.into_iter().map(|v| v.message).collect())
    }
}

/// Evaluate a whole document, keyed by the path of each failure.
pub fn validate_whole(schema: &Schema, record: &Value) -> ErrorTree {
    schema.validate_whole(record)
}

/// Root rule of a document plus path lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    root: Rule,
}

impl Schema {
    pub fn new(root: Rule) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Rule {
        &self.root
    }

    /// Rule governing the value at `path`, if the schema constrains it.
    pub fn rule_at(&self, path: &Path) -> Option<&Rule> {
        path.segments()
            .iter()
            .try_fold(&self.root, |rule, segment| rule.child(segment))
    }

    /// Evaluate `record` against the root rule.
    pub fn validate_whole(&self, record: &Value) -> ErrorTree {
        let mut tree = ErrorTree::new();
        for violation in self.root.evaluate(Some(record), &Path::root()) {
            tree.push(violation.path, violation.message);
        }
        tree
    }
}
