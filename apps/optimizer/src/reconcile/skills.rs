use std::collections::HashSet;

use crate::models::resume::Skills;

/// Comparison key for a skill: trimmed and lowercased.
pub fn skill_key(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// Keeps the first spelling of every skill across all categories.
///
/// Categories are walked in their canonical order (technical, frameworks,
/// tools, languages); surviving entries keep their relative order.
pub fn dedupe_skills(skills: &mut Skills) {
    let mut seen = HashSet::new();
    for category in skills.categories_mut() {
        category.retain(|skill| seen.insert(skill_key(skill)));
    }
}
