//! Field-level and collection-level edits on a `Resume` draft.
//!
//! Values arrive as JSON from the forms. They are decoded into the field's Rust
//! type but never format-checked here; format rules run at the save boundary.

use std::fmt;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::editor::EditorError;
use crate::models::resume::{
    Certification, Education, Project, Resume, Section, Skill, WorkExperience,
};

/// Every top-level attribute a form may replace. Identity fields and
/// timestamps are deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeField {
    Name,
    TargetRole,
    IsBaseResume,
    FirstName,
    LastName,
    Email,
    PhoneNumber,
    Location,
    Website,
    LinkedinUrl,
    GithubUrl,
    ProfessionalSummary,
    WorkExperience,
    Education,
    Skills,
    Projects,
    Certifications,
    DocumentSettings,
    SectionOrder,
    SectionConfigs,
}

const RESUME_FIELD_NAMES: &[(&str, ResumeField)] = &[
    ("name", ResumeField::Name),
    ("target_role", ResumeField::TargetRole),
    ("is_base_resume", ResumeField::IsBaseResume),
    ("first_name", ResumeField::FirstName),
    ("last_name", ResumeField::LastName),
    ("email", ResumeField::Email),
    ("phone_number", ResumeField::PhoneNumber),
    ("location", ResumeField::Location),
    ("website", ResumeField::Website),
    ("linkedin_url", ResumeField::LinkedinUrl),
    ("github_url", ResumeField::GithubUrl),
    ("professional_summary", ResumeField::ProfessionalSummary),
    ("work_experience", ResumeField::WorkExperience),
    ("education", ResumeField::Education),
    ("skills", ResumeField::Skills),
    ("projects", ResumeField::Projects),
    ("certifications", ResumeField::Certifications),
    ("document_settings", ResumeField::DocumentSettings),
    ("section_order", ResumeField::SectionOrder),
    ("section_configs", ResumeField::SectionConfigs),
];

impl ResumeField {
    pub fn as_str(&self) -> &'static str {
        RESUME_FIELD_NAMES
            .iter()
            .find(|(_, f)| f == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for ResumeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResumeField {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RESUME_FIELD_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, field)| *field)
            .ok_or_else(|| EditorError::UnknownField(s.to_string()))
    }
}

fn decode<T: DeserializeOwned>(field: &str, value: Value) -> Result<T, EditorError> {
    serde_json::from_value(value).map_err(|e| EditorError::FieldType {
        field: field.to_string(),
        message: e.to_string(),
    })
}

/// Replaces exactly one top-level attribute. On a decode failure the draft is untouched.
pub fn apply_field(resume: &mut Resume, field: ResumeField, value: Value) -> Result<(), EditorError> {
    let name = field.as_str();
    match field {
        ResumeField::Name => resume.name = decode(name, value)?,
        ResumeField::TargetRole => resume.target_role = decode(name, value)?,
        ResumeField::IsBaseResume => resume.is_base_resume = decode(name, value)?,
        ResumeField::FirstName => resume.first_name = decode(name, value)?,
        ResumeField::LastName => resume.last_name = decode(name, value)?,
        ResumeField::Email => resume.email = decode(name, value)?,
        ResumeField::PhoneNumber => resume.phone_number = decode(name, value)?,
        ResumeField::Location => resume.location = decode(name, value)?,
        ResumeField::Website => resume.website = decode(name, value)?,
        ResumeField::LinkedinUrl => resume.linkedin_url = decode(name, value)?,
        ResumeField::GithubUrl => resume.github_url = decode(name, value)?,
        ResumeField::ProfessionalSummary => resume.professional_summary = decode(name, value)?,
        ResumeField::WorkExperience => resume.work_experience = decode(name, value)?,
        ResumeField::Education => resume.education = decode(name, value)?,
        ResumeField::Skills => resume.skills = decode(name, value)?,
        ResumeField::Projects => resume.projects = decode(name, value)?,
        ResumeField::Certifications => resume.certifications = decode(name, value)?,
        ResumeField::DocumentSettings => resume.document_settings = decode(name, value)?,
        ResumeField::SectionOrder => resume.section_order = decode(name, value)?,
        ResumeField::SectionConfigs => resume.section_configs = decode(name, value)?,
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Collection items
// ────────────────────────────────────────────────────────────────────────────

/// An entity held in one of the résumé's ordered sub-collections.
pub trait SectionItem: Serialize + DeserializeOwned + Default {
    const FIELDS: &'static [&'static str];

    /// Replaces one attribute. `null` clears an optional attribute.
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), EditorError> {
        if !Self::FIELDS.contains(&field) {
            return Err(EditorError::UnknownField(field.to_string()));
        }
        let current = serde_json::to_value(&*self).map_err(|e| EditorError::FieldType {
            field: field.to_string(),
            message: e.to_string(),
        })?;
        let Value::Object(mut map) = current else {
            return Err(EditorError::FieldType {
                field: field.to_string(),
                message: "entity did not serialize to an object".to_string(),
            });
        };
        if value.is_null() {
            map.remove(field);
        } else {
            map.insert(field.to_string(), value);
        }
        *self = decode(field, Value::Object(map))?;
        Ok(())
    }
}

impl SectionItem for WorkExperience {
    const FIELDS: &'static [&'static str] = &[
        "company",
        "position",
        "location",
        "date",
        "description",
        "technologies",
    ];
}

impl SectionItem for Education {
    const FIELDS: &'static [&'static str] = &[
        "school",
        "degree",
        "field",
        "location",
        "date",
        "gpa",
        "achievements",
    ];
}

impl SectionItem for Project {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "description",
        "date",
        "technologies",
        "url",
        "github_url",
    ];
}

impl SectionItem for Skill {
    const FIELDS: &'static [&'static str] = &["category", "items"];
}

impl SectionItem for Certification {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "issuer",
        "date_acquired",
        "expiry_date",
        "credential_id",
        "url",
    ];
}

fn update_item<T: SectionItem>(
    items: &mut [T],
    section: Section,
    index: usize,
    field: &str,
    value: Value,
) -> Result<(), EditorError> {
    let len = items.len();
    let item = items.get_mut(index).ok_or(EditorError::IndexOutOfRange {
        section,
        index,
        len,
    })?;
    item.set_field(field, value)
}

fn add_item<T: SectionItem>(items: &mut Vec<T>) -> usize {
    items.push(T::default());
    items.len() - 1
}

fn remove_item<T>(items: &mut Vec<T>, index: usize) -> bool {
    if index < items.len() {
        items.remove(index);
        true
    } else {
        false
    }
}

pub fn update_collection_item(
    resume: &mut Resume,
    section: Section,
    index: usize,
    field: &str,
    value: Value,
) -> Result<(), EditorError> {
    match section {
        Section::WorkExperience => {
            update_item(&mut resume.work_experience, section, index, field, value)
        }
        Section::Education => update_item(&mut resume.education, section, index, field, value),
        Section::Skills => update_item(&mut resume.skills, section, index, field, value),
        Section::Projects => update_item(&mut resume.projects, section, index, field, value),
        Section::Certifications => {
            update_item(&mut resume.certifications, section, index, field, value)
        }
    }
}

/// Appends a blank entity and returns its index.
pub fn add_collection_item(resume: &mut Resume, section: Section) -> usize {
    match section {
        Section::WorkExperience => add_item(&mut resume.work_experience),
        Section::Education => add_item(&mut resume.education),
        Section::Skills => add_item(&mut resume.skills),
        Section::Projects => add_item(&mut resume.projects),
        Section::Certifications => add_item(&mut resume.certifications),
    }
}

/// Removes the entity at `index`. Returns `false` (and changes nothing) when absent.
pub fn remove_collection_item(resume: &mut Resume, section: Section, index: usize) -> bool {
    match section {
        Section::WorkExperience => remove_item(&mut resume.work_experience, index),
        Section::Education => remove_item(&mut resume.education, index),
        Section::Skills => remove_item(&mut resume.skills, index),
        Section::Projects => remove_item(&mut resume.projects, index),
        Section::Certifications => remove_item(&mut resume.certifications, index),
    }
}

pub fn section_len(resume: &Resume, section: Section) -> usize {
    match section {
        Section::WorkExperience => resume.work_experience.len(),
        Section::Education => resume.education.len(),
        Section::Skills => resume.skills.len(),
        Section::Projects => resume.projects.len(),
        Section::Certifications => resume.certifications.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::fixtures::blank_resume;
    use serde_json::json;

    #[test]
    fn test_field_names_round_trip() {
        for (name, field) in RESUME_FIELD_NAMES {
            assert_eq!(name.parse::<ResumeField>().unwrap(), *field);
            assert_eq!(field.as_str(), *name);
        }
    }

    #[test]
    fn test_identity_fields_are_not_editable() {
        for name in ["id", "user_id", "created_at", "updated_at", "nickname"] {
            assert!(matches!(
                name.parse::<ResumeField>(),
                Err(EditorError::UnknownField(_))
            ));
        }
    }

    #[test]
    fn test_apply_field_replaces_only_target() {
        let mut resume = blank_resume();
        let before = resume.clone();
        apply_field(&mut resume, ResumeField::Location, json!("Berlin")).unwrap();

        assert_eq!(resume.location.as_deref(), Some("Berlin"));
        let mut expected = before;
        expected.location = Some("Berlin".to_string());
        assert_eq!(resume, expected);
    }

    #[test]
    fn test_apply_field_does_not_check_formats() {
        let mut resume = blank_resume();
        apply_field(&mut resume, ResumeField::Website, json!("not-a-url")).unwrap();
        apply_field(&mut resume, ResumeField::Email, json!("nope")).unwrap();
        assert_eq!(resume.website.as_deref(), Some("not-a-url"));
        assert_eq!(resume.email, "nope");
    }

    #[test]
    fn test_apply_field_type_mismatch_leaves_draft() {
        let mut resume = blank_resume();
        let before = resume.clone();
        let err = apply_field(&mut resume, ResumeField::IsBaseResume, json!("yes")).unwrap_err();
        assert!(matches!(err, EditorError::FieldType { ref field, .. } if field == "is_base_resume"));
        assert_eq!(resume, before);
    }

    #[test]
    fn test_apply_whole_collection() {
        let mut resume = blank_resume();
        apply_field(
            &mut resume,
            ResumeField::Skills,
            json!([{ "category": "Languages", "items": ["Rust"] }]),
        )
        .unwrap();
        assert_eq!(resume.skills.len(), 1);
    }

    #[test]
    fn test_item_set_field() {
        let mut project = Project::default();
        project.set_field("url", json!("https://cv.dev")).unwrap();
        project
            .set_field("technologies", json!(["Rust", "Axum"]))
            .unwrap();
        assert_eq!(project.url.as_deref(), Some("https://cv.dev"));
        assert_eq!(project.technologies.as_ref().unwrap().len(), 2);

        project.set_field("url", Value::Null).unwrap();
        assert!(project.url.is_none());
    }

    #[test]
    fn test_item_unknown_field() {
        let mut skill = Skill::default();
        assert!(matches!(
            skill.set_field("level", json!("expert")),
            Err(EditorError::UnknownField(_))
        ));
    }

    #[test]
    fn test_item_required_field_rejects_null() {
        let mut skill = Skill {
            category: "Tools".to_string(),
            items: vec!["git".to_string()],
        };
        assert!(skill.set_field("items", Value::Null).is_err());
        assert_eq!(skill.items, vec!["git"]);
    }

    #[test]
    fn test_add_then_update_collection_item() {
        let mut resume = blank_resume();
        let index = add_collection_item(&mut resume, Section::WorkExperience);
        assert_eq!(index, 0);
        assert_eq!(resume.work_experience[0].company, "");

        update_collection_item(&mut resume, Section::WorkExperience, 0, "company", json!("Acme"))
            .unwrap();
        assert_eq!(resume.work_experience[0].company, "Acme");
        assert_eq!(resume.work_experience.len(), 1);
    }

    #[test]
    fn test_update_out_of_range_is_error() {
        let mut resume = blank_resume();
        add_collection_item(&mut resume, Section::Education);
        let before = resume.clone();
        let err = update_collection_item(&mut resume, Section::Education, 3, "school", json!("MIT"))
            .unwrap_err();
        assert!(matches!(
            err,
            EditorError::IndexOutOfRange { index: 3, len: 1, .. }
        ));
        assert_eq!(resume, before);
    }

    #[test]
    fn test_update_leaves_siblings_alone() {
        let mut resume = blank_resume();
        for name in ["a", "b", "c"] {
            let i = add_collection_item(&mut resume, Section::Projects);
            update_collection_item(&mut resume, Section::Projects, i, "name", json!(name)).unwrap();
        }
        update_collection_item(&mut resume, Section::Projects, 1, "date", json!("2023")).unwrap();

        let names: Vec<_> = resume.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(resume.projects[0].date.is_none());
        assert_eq!(resume.projects[1].date.as_deref(), Some("2023"));
        assert!(resume.projects[2].date.is_none());
    }

    #[test]
    fn test_remove_shifts_and_tolerates_missing() {
        let mut resume = blank_resume();
        for category in ["x", "y", "z"] {
            let i = add_collection_item(&mut resume, Section::Skills);
            update_collection_item(&mut resume, Section::Skills, i, "category", json!(category))
                .unwrap();
        }
        assert!(remove_collection_item(&mut resume, Section::Skills, 0));
        assert_eq!(resume.skills[0].category, "y");
        assert_eq!(section_len(&resume, Section::Skills), 2);

        assert!(!remove_collection_item(&mut resume, Section::Skills, 9));
        assert_eq!(section_len(&resume, Section::Skills), 2);
    }

    #[test]
    fn test_add_then_remove_restores_sequence() {
        let mut resume = blank_resume();
        add_collection_item(&mut resume, Section::Certifications);
        update_collection_item(&mut resume, Section::Certifications, 0, "name", json!("CKA"))
            .unwrap();
        let before = resume.certifications.clone();

        let index = add_collection_item(&mut resume, Section::Certifications);
        assert!(remove_collection_item(&mut resume, Section::Certifications, index));
        assert_eq!(resume.certifications, before);
    }
}
