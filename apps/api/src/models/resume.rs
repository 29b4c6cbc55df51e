use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// The root résumé aggregate. This shape is also the storage and wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_role: String,
    pub is_base_resume: bool,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_summary: Option<String>,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_settings: Option<DocumentSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_order: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_configs: Option<BTreeMap<String, SectionConfig>>,
}

impl Resume {
    /// Header title: base résumés are named after their target role.
    pub fn display_title(&self) -> String {
        if self.is_base_resume {
            capitalize_words(&self.target_role)
        } else {
            self.name.clone()
        }
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_base_resume {
            "Base Resume"
        } else {
            "Tailored Resume"
        }
    }

    /// Suggested download name for an exported PDF.
    pub fn pdf_file_name(&self) -> String {
        format!("{}_{}_Resume.pdf", self.first_name, self.last_name)
    }
}

fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + c.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub date: String,
    pub description: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_acquired: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Document styling parameters. Units are presentation-defined; only finiteness is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    pub document_font_size: f64,
    pub document_line_height: f64,
    pub document_margin_vertical: f64,
    pub document_margin_horizontal: f64,

    pub header_name_size: f64,
    pub header_name_bottom_spacing: f64,

    pub skills_margin_top: f64,
    pub skills_margin_bottom: f64,
    pub skills_margin_horizontal: f64,
    pub skills_item_spacing: f64,

    pub experience_margin_top: f64,
    pub experience_margin_bottom: f64,
    pub experience_margin_horizontal: f64,
    pub experience_item_spacing: f64,

    pub projects_margin_top: f64,
    pub projects_margin_bottom: f64,
    pub projects_margin_horizontal: f64,
    pub projects_item_spacing: f64,

    pub education_margin_top: f64,
    pub education_margin_bottom: f64,
    pub education_margin_horizontal: f64,
    pub education_item_spacing: f64,
}

impl DocumentSettings {
    pub const FIELDS: &'static [&'static str] = &[
        "document_font_size",
        "document_line_height",
        "document_margin_vertical",
        "document_margin_horizontal",
        "header_name_size",
        "header_name_bottom_spacing",
        "skills_margin_top",
        "skills_margin_bottom",
        "skills_margin_horizontal",
        "skills_item_spacing",
        "experience_margin_top",
        "experience_margin_bottom",
        "experience_margin_horizontal",
        "experience_item_spacing",
        "projects_margin_top",
        "projects_margin_bottom",
        "projects_margin_horizontal",
        "projects_item_spacing",
        "education_margin_top",
        "education_margin_bottom",
        "education_margin_horizontal",
        "education_item_spacing",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStyle {
    Grouped,
    List,
    Grid,
}

impl SectionStyle {
    pub const ALL: &'static [&'static str] = &["grouped", "list", "grid"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub visible: bool,
    /// `None` covers both an absent and an explicit `null` cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<SectionStyle>,
}

/// The ordered sub-collections of a résumé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    WorkExperience,
    Education,
    Skills,
    Projects,
    Certifications,
}

impl Section {
    /// Default rendering order when a résumé has no `section_order`.
    pub const DEFAULT_ORDER: [Section; 5] = [
        Section::WorkExperience,
        Section::Education,
        Section::Skills,
        Section::Projects,
        Section::Certifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::WorkExperience => "work_experience",
            Section::Education => "education",
            Section::Skills => "skills",
            Section::Projects => "projects",
            Section::Certifications => "certifications",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Section::WorkExperience => "Work Experience",
            Section::Education => "Education",
            Section::Skills => "Skills",
            Section::Projects => "Projects",
            Section::Certifications => "Certifications",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work_experience" => Ok(Section::WorkExperience),
            "education" => Ok(Section::Education),
            "skills" => Ok(Section::Skills),
            "projects" => Ok(Section::Projects),
            "certifications" => Ok(Section::Certifications),
            other => Err(format!("unknown section '{other}'")),
        }
    }
}

/// Storage row: indexed columns plus the full validated document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_role: String,
    pub is_base_resume: bool,
    pub document: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
