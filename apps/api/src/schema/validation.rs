//! Résumé validation: the single trust boundary between stored/edited JSON and `Resume`.
//!
//! `validate_resume` walks an arbitrary JSON value, normalizes optional fields
//! (empty strings and `null` become absent), collects every violation with its
//! field path, and only then decodes the normalized document into a `Resume`.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::resume::{DocumentSettings, Resume, SectionStyle};
use crate::schema::formats::{is_email, is_timestamp, is_url, is_uuid};

/// The expectation a field failed to meet.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    #[error("required field is missing")]
    MissingField,
    #[error("expected {expected}")]
    WrongType { expected: &'static str },
    #[error("must be a well-formed absolute URL")]
    MalformedUrl,
    #[error("must be a well-formed email address")]
    MalformedEmail,
    #[error("must be a well-formed UUID")]
    MalformedUuid,
    #[error("must be an RFC 3339 date-time with a Z or ±HH:MM offset")]
    MalformedTimestamp,
    #[error("must be a finite number")]
    NonFiniteNumber,
    #[error("must be one of {allowed:?}")]
    NotInEnumeration { allowed: &'static [&'static str] },
    #[error("document shape rejected: {message}")]
    Shape { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub path: String,
    pub rule: Rule,
}

/// Every violation found in one validation pass, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{}", render_violations(.violations))]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

#[cfg(test)]
impl ValidationErrors {
    /// True if any violation is reported at exactly `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }

    pub fn rule_at(&self, path: &str) -> Option<&Rule> {
        self.violations
            .iter()
            .find(|v| v.path == path)
            .map(|v| &v.rule)
    }
}

fn render_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| {
            let path = if v.path.is_empty() { "<root>" } else { &v.path };
            format!("{path}: {}", v.rule)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates any résumé-shaped JSON value. Pure and synchronous.
pub fn validate_resume(value: &Value) -> Result<Resume, ValidationErrors> {
    let mut doc = value.clone();
    let mut validator = Validator::default();

    match doc.as_object_mut() {
        Some(obj) => validator.resume(obj),
        None => validator.push("", Rule::WrongType { expected: "object" }),
    }
    validator.finish()?;

    serde_json::from_value(doc).map_err(|e| ValidationErrors {
        violations: vec![FieldViolation {
            path: String::new(),
            rule: Rule::Shape {
                message: e.to_string(),
            },
        }],
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Field rules
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Kind {
    Str,
    Bool,
    Email,
    Url,
    Uuid,
    Timestamp,
    StrList,
    Number,
    Count,
    OneOf(&'static [&'static str]),
}

#[derive(Clone, Copy, PartialEq)]
enum Presence {
    Required,
    Optional,
}

use Kind::*;
use Presence::*;

const RESUME_FIELDS: &[(&str, Kind, Presence)] = &[
    ("id", Uuid, Required),
    ("user_id", Uuid, Required),
    ("name", Str, Required),
    ("target_role", Str, Required),
    ("is_base_resume", Bool, Required),
    ("first_name", Str, Required),
    ("last_name", Str, Required),
    ("email", Email, Required),
    ("phone_number", Str, Optional),
    ("location", Str, Optional),
    ("website", Url, Optional),
    ("linkedin_url", Url, Optional),
    ("github_url", Url, Optional),
    ("professional_summary", Str, Optional),
    ("created_at", Timestamp, Required),
    ("updated_at", Timestamp, Required),
    ("section_order", StrList, Optional),
];

const WORK_EXPERIENCE_FIELDS: &[(&str, Kind, Presence)] = &[
    ("company", Str, Required),
    ("position", Str, Required),
    ("location", Str, Optional),
    ("date", Str, Required),
    ("description", StrList, Required),
    ("technologies", StrList, Optional),
];

const EDUCATION_FIELDS: &[(&str, Kind, Presence)] = &[
    ("school", Str, Required),
    ("degree", Str, Required),
    ("field", Str, Required),
    ("location", Str, Optional),
    ("date", Str, Required),
    ("gpa", Str, Optional),
    ("achievements", StrList, Optional),
];

const PROJECT_FIELDS: &[(&str, Kind, Presence)] = &[
    ("name", Str, Required),
    ("description", StrList, Required),
    ("date", Str, Optional),
    ("technologies", StrList, Optional),
    ("url", Url, Optional),
    ("github_url", Url, Optional),
];

const SKILL_FIELDS: &[(&str, Kind, Presence)] = &[
    ("category", Str, Required),
    ("items", StrList, Required),
];

const CERTIFICATION_FIELDS: &[(&str, Kind, Presence)] = &[
    ("name", Str, Required),
    ("issuer", Str, Required),
    ("date_acquired", Str, Optional),
    ("expiry_date", Str, Optional),
    ("credential_id", Str, Optional),
    ("url", Url, Optional),
];

const SECTION_CONFIG_FIELDS: &[(&str, Kind, Presence)] = &[
    ("visible", Bool, Required),
    ("max_items", Count, Optional),
    ("style", OneOf(SectionStyle::ALL), Optional),
];

const COLLECTIONS: &[(&str, &[(&str, Kind, Presence)])] = &[
    ("work_experience", WORK_EXPERIENCE_FIELDS),
    ("education", EDUCATION_FIELDS),
    ("skills", SKILL_FIELDS),
    ("projects", PROJECT_FIELDS),
    ("certifications", CERTIFICATION_FIELDS),
];

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

#[derive(Default)]
struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    fn push(&mut self, path: &str, rule: Rule) {
        self.violations.push(FieldViolation {
            path: path.to_string(),
            rule,
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                violations: self.violations,
            })
        }
    }

    fn resume(&mut self, obj: &mut Map<String, Value>) {
        self.fields(obj, "", RESUME_FIELDS);

        for (key, item_fields) in COLLECTIONS {
            if let Some(items) = self.present(obj, "", key, Required) {
                self.collection(items, key, item_fields);
            }
        }

        if let Some(settings) = self.present(obj, "", "document_settings", Optional) {
            match settings.as_object_mut() {
                Some(settings) => {
                    for key in DocumentSettings::FIELDS {
                        let path = join("document_settings", key);
                        match settings.get(*key) {
                            None => self.push(&path, Rule::MissingField),
                            Some(v) => self.check(&path, v, Number),
                        }
                    }
                }
                None => self.push("document_settings", Rule::WrongType { expected: "object" }),
            }
        }

        if let Some(configs) = self.present(obj, "", "section_configs", Optional) {
            match configs.as_object_mut() {
                Some(configs) => {
                    for (name, config) in configs.iter_mut() {
                        let path = join("section_configs", name);
                        match config.as_object_mut() {
                            Some(config) => self.fields(config, &path, SECTION_CONFIG_FIELDS),
                            None => self.push(&path, Rule::WrongType { expected: "object" }),
                        }
                    }
                }
                None => self.push("section_configs", Rule::WrongType { expected: "object" }),
            }
        }
    }

    fn collection(&mut self, items: &mut Value, key: &str, item_fields: &[(&str, Kind, Presence)]) {
        let Some(items) = items.as_array_mut() else {
            self.push(key, Rule::WrongType { expected: "array" });
            return;
        };
        for (i, item) in items.iter_mut().enumerate() {
            let path = format!("{key}[{i}]");
            match item.as_object_mut() {
                Some(item) => self.fields(item, &path, item_fields),
                None => self.push(&path, Rule::WrongType { expected: "object" }),
            }
        }
    }

    fn fields(&mut self, obj: &mut Map<String, Value>, parent: &str, rules: &[(&str, Kind, Presence)]) {
        for (key, kind, presence) in rules {
            if let Some(value) = self.present(obj, parent, key, *presence) {
                self.check(&join(parent, key), value, *kind);
            }
        }
    }

    /// Normalizes an optional slot (blank string or null → absent) and reports
    /// a missing required one. Returns the value when there is one to check.
    fn present<'a>(
        &mut self,
        obj: &'a mut Map<String, Value>,
        parent: &str,
        key: &str,
        presence: Presence,
    ) -> Option<&'a mut Value> {
        if presence == Optional {
            let blank = match obj.get(key) {
                Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                _ => false,
            };
            if blank {
                obj.remove(key);
            }
        }
        if !obj.contains_key(key) && presence == Required {
            self.push(&join(parent, key), Rule::MissingField);
        }
        obj.get_mut(key)
    }

    fn check(&mut self, path: &str, value: &Value, kind: Kind) {
        match kind {
            Str => {
                if !value.is_string() {
                    self.push(path, Rule::WrongType { expected: "string" });
                }
            }
            Bool => {
                if !value.is_boolean() {
                    self.push(path, Rule::WrongType { expected: "boolean" });
                }
            }
            Email => self.formatted(path, value, is_email, Rule::MalformedEmail),
            Url => self.formatted(path, value, is_url, Rule::MalformedUrl),
            Uuid => self.formatted(path, value, is_uuid, Rule::MalformedUuid),
            Timestamp => self.formatted(path, value, is_timestamp, Rule::MalformedTimestamp),
            StrList => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if !item.is_string() {
                            self.push(&format!("{path}[{i}]"), Rule::WrongType { expected: "string" });
                        }
                    }
                }
                None => self.push(path, Rule::WrongType { expected: "array of strings" }),
            },
            Number => match value.as_f64() {
                Some(n) if n.is_finite() => {}
                Some(_) => self.push(path, Rule::NonFiniteNumber),
                None => self.push(path, Rule::WrongType { expected: "number" }),
            },
            Count => {
                let fits = value.as_u64().is_some_and(|n| n <= u64::from(u32::MAX));
                if !fits {
                    self.push(path, Rule::WrongType { expected: "non-negative integer" });
                }
            }
            OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                Some(_) => self.push(path, Rule::NotInEnumeration { allowed }),
                None => self.push(path, Rule::WrongType { expected: "string" }),
            },
        }
    }

    fn formatted(&mut self, path: &str, value: &Value, ok: fn(&str) -> bool, rule: Rule) {
        match value.as_str() {
            Some(s) if ok(s) => {}
            Some(_) => self.push(path, rule),
            None => self.push(path, Rule::WrongType { expected: "string" }),
        }
    }
}
