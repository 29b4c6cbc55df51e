//! Plain-text preview renderer: a Markdown-like view of the résumé, wrapped
//! to the layout width. Honors `section_order` and per-section configs.

use crate::models::resume::{Resume, Section, SectionConfig};
use crate::render::wrap::wrap;
use crate::render::{PreviewFrame, PreviewRenderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct TextPreviewRenderer;

impl PreviewRenderer for TextPreviewRenderer {
    fn render(&self, resume: &Resume, revision: u64, layout_width: usize) -> PreviewFrame {
        PreviewFrame {
            revision,
            title: resume.display_title(),
            body: render_resume(resume, layout_width),
        }
    }
}

/// Sections in display order: the résumé's own `section_order` first (unknown
/// names ignored, duplicates dropped), then any remaining defaults.
pub fn ordered_sections(resume: &Resume) -> Vec<Section> {
    let mut order: Vec<Section> = Vec::new();
    for name in resume.section_order.iter().flatten() {
        if let Ok(section) = name.parse::<Section>() {
            if !order.contains(&section) {
                order.push(section);
            }
        }
    }
    for section in Section::DEFAULT_ORDER {
        if !order.contains(&section) {
            order.push(section);
        }
    }
    order
}

fn config_for<'a>(resume: &'a Resume, section: Section) -> Option<&'a SectionConfig> {
    resume
        .section_configs
        .as_ref()
        .and_then(|configs| configs.get(section.as_str()))
}

fn render_resume(resume: &Resume, width: usize) -> String {
    let mut out = String::new();

    let full_name = format!("{} {}", resume.first_name, resume.last_name);
    out.push_str(&format!("# {}\n", full_name.trim()));

    let contact: Vec<&str> = [
        Some(resume.email.as_str()),
        resume.phone_number.as_deref(),
        resume.location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect();
    push_wrapped(&mut out, &contact.join(" | "), width, "");

    let links: Vec<&str> = [
        resume.website.as_deref(),
        resume.linkedin_url.as_deref(),
        resume.github_url.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect();
    push_wrapped(&mut out, &links.join(" | "), width, "");

    if let Some(summary) = resume.professional_summary.as_deref() {
        if !summary.trim().is_empty() {
            out.push_str("\n## Summary\n");
            push_wrapped(&mut out, summary, width, "");
        }
    }

    for section in ordered_sections(resume) {
        let config = config_for(resume, section);
        if config.is_some_and(|c| !c.visible) {
            continue;
        }
        let cap = config.and_then(|c| c.max_items).map(|n| n as usize);
        let body = render_section(resume, section, cap.unwrap_or(usize::MAX), width);
        if body.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {}\n", section.heading()));
        out.push_str(&body);
    }

    out
}

fn render_section(resume: &Resume, section: Section, cap: usize, width: usize) -> String {
    let mut out = String::new();
    match section {
        Section::WorkExperience => {
            for job in resume.work_experience.iter().take(cap) {
                let heading = join_parts(&[&job.position, &job.company]);
                push_entry_heading(&mut out, &heading, job.location.as_deref(), &job.date, width);
                push_bullets(&mut out, &job.description, width);
                push_tags(&mut out, "Technologies", job.technologies.as_deref(), width);
            }
        }
        Section::Education => {
            for edu in resume.education.iter().take(cap) {
                let degree = join_parts(&[&edu.degree, &edu.field]);
                let heading = join_parts(&[&edu.school, &degree]);
                push_entry_heading(&mut out, &heading, edu.location.as_deref(), &edu.date, width);
                if let Some(gpa) = edu.gpa.as_deref() {
                    push_wrapped(&mut out, &format!("GPA: {gpa}"), width, "");
                }
                push_bullets(&mut out, edu.achievements.as_deref().unwrap_or_default(), width);
            }
        }
        Section::Skills => {
            for skill in resume.skills.iter().take(cap) {
                let line = format!("**{}:** {}", skill.category, skill.items.join(", "));
                push_wrapped(&mut out, &line, width, "  ");
            }
        }
        Section::Projects => {
            for project in resume.projects.iter().take(cap) {
                let date = project.date.as_deref().unwrap_or_default();
                push_entry_heading(&mut out, &project.name, None, date, width);
                let links: Vec<&str> = [project.url.as_deref(), project.github_url.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect();
                if !links.is_empty() {
                    push_wrapped(&mut out, &links.join(" | "), width, "");
                }
                push_bullets(&mut out, &project.description, width);
                push_tags(&mut out, "Technologies", project.technologies.as_deref(), width);
            }
        }
        Section::Certifications => {
            for cert in resume.certifications.iter().take(cap) {
                let mut line = join_parts(&[&cert.name, &cert.issuer]);
                let dates = match (cert.date_acquired.as_deref(), cert.expiry_date.as_deref()) {
                    (Some(from), Some(to)) => format!("{from} – {to}"),
                    (Some(from), None) => from.to_string(),
                    (None, Some(to)) => format!("expires {to}"),
                    (None, None) => String::new(),
                };
                if !dates.is_empty() {
                    line.push_str(&format!(" ({dates})"));
                }
                if let Some(id) = cert.credential_id.as_deref() {
                    line.push_str(&format!(", ID {id}"));
                }
                push_wrapped(&mut out, &format!("- {line}"), width, "  ");
                if let Some(url) = cert.url.as_deref() {
                    push_wrapped(&mut out, &format!("  {url}"), width, "  ");
                }
            }
        }
    }
    out
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_entry_heading(out: &mut String, heading: &str, location: Option<&str>, date: &str, width: usize) {
    let mut line = format!("### {heading}");
    if let Some(location) = location.filter(|l| !l.trim().is_empty()) {
        line.push_str(&format!(" ({location})"));
    }
    if !date.trim().is_empty() {
        line.push_str(&format!(" · {date}"));
    }
    push_wrapped(out, &line, width, "    ");
}

fn push_bullets(out: &mut String, bullets: &[String], width: usize) {
    for bullet in bullets {
        push_wrapped(out, &format!("- {bullet}"), width, "  ");
    }
}

fn push_tags(out: &mut String, label: &str, tags: Option<&[String]>, width: usize) {
    if let Some(tags) = tags.filter(|t| !t.is_empty()) {
        push_wrapped(out, &format!("{label}: {}", tags.join(", ")), width, "  ");
    }
}

fn push_wrapped(out: &mut String, text: &str, width: usize, hanging: &str) {
    for line in wrap(text, width, hanging) {
        out.push_str(&line);
        out.push('\n');
    }
}
