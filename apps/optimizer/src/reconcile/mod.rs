//! Reconciliation Engine: merges accepted suggestions into a copy of the résumé.
//!
//! Rules, applied in suggestion order:
//! - `skills` / `add_keyword`: append `suggested` to `skills.technical` unless
//!   any category already holds it (case-insensitive, trimmed).
//! - `experience`: every description line equal to `original` becomes `suggested`.
//! - `projects`: every description equal to `original` becomes `suggested`.
//! - anything else: ignored. The suggestion vocabulary belongs to the backend
//!   and grows without notice.
//!
//! A final pass deduplicates skills across all categories. No I/O happens
//! here; the caller persists the result.

mod skills;

use tracing::debug;

use crate::models::optimization::Suggestion;
use crate::models::resume::ResumeData;

pub use skills::{dedupe_skills, skill_key};

const SECTION_SKILLS: &str = "skills";
const SECTION_EXPERIENCE: &str = "experience";
const SECTION_PROJECTS: &str = "projects";
const KIND_ADD_KEYWORD: &str = "add_keyword";

/// Returns a new document with `accepted` applied. `base` is left untouched.
///
/// The caller passes only the suggestions the user accepted.
pub fn reconcile(base: &ResumeData, accepted: &[Suggestion]) -> ResumeData {
    let mut document = base.clone();

    for suggestion in accepted {
        apply_suggestion(&mut document, suggestion);
    }

    dedupe_skills(&mut document.skills);
    document
}

fn apply_suggestion(document: &mut ResumeData, suggestion: &Suggestion) {
    match (suggestion.section.as_str(), suggestion.kind.as_str()) {
        (SECTION_SKILLS, KIND_ADD_KEYWORD) => add_keyword(document, &suggestion.suggested),
        (SECTION_EXPERIENCE, _) => {
            replace_experience_lines(document, &suggestion.original, &suggestion.suggested)
        }
        (SECTION_PROJECTS, _) => {
            replace_project_descriptions(document, &suggestion.original, &suggestion.suggested)
        }
        (section, kind) => {
            debug!("No reconciliation rule for {section}/{kind}; skipping");
        }
    }
}

fn add_keyword(document: &mut ResumeData, keyword: &str) {
    let key = skill_key(keyword);
    let present = document
        .skills
        .categories()
        .iter()
        .any(|category| category.iter().any(|skill| skill_key(skill) == key));

    if !present {
        document.skills.technical.push(keyword.to_string());
    }
}

fn replace_experience_lines(document: &mut ResumeData, original: &str, suggested: &str) {
    for entry in &mut document.experience {
        for line in &mut entry.description {
            if line == original {
                *line = suggested.to_string();
            }
        }
    }
}

fn replace_project_descriptions(document: &mut ResumeData, original: &str, suggested: &str) {
    for project in &mut document.projects {
        if project.description == original {
            project.description = suggested.to_string();
        }
    }
}
