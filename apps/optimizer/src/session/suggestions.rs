//! Suggestion Store: the latest suggestion set plus per-item acceptance.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::optimization::Suggestion;

#[derive(Debug, Error, PartialEq)]
pub enum SuggestionError {
    #[error("suggestion index {index} out of range (have {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Holds one suggestion list at a time. Owned by a single session and
/// dropped with it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SuggestionStore {
    items: Vec<Suggestion>,
}

impl SuggestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a freshly delivered list, replacing the current one.
    ///
    /// Server-sent `accepted` values are ignored. An item is accepted after
    /// the refresh only if the same change was accepted before it. Repeated
    /// changes within `incoming` keep their first occurrence.
    pub fn replace(&mut self, incoming: Vec<Suggestion>) {
        let previously_accepted: Vec<&Suggestion> =
            self.items.iter().filter(|s| s.accepted).collect();

        let mut next: Vec<Suggestion> = Vec::with_capacity(incoming.len());
        for mut suggestion in incoming {
            if next.iter().any(|kept| kept.same_change(&suggestion)) {
                debug!(
                    "Dropping repeated suggestion for {}/{}",
                    suggestion.section, suggestion.kind
                );
                continue;
            }
            suggestion.accepted = previously_accepted
                .iter()
                .any(|prev| prev.same_change(&suggestion));
            next.push(suggestion);
        }

        self.items = next;
    }

    /// Flips `accepted` on exactly one item and returns its new value.
    pub fn toggle(&mut self, index: usize) -> Result<bool, SuggestionError> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(SuggestionError::OutOfRange { index, len })?;
        item.accepted = !item.accepted;
        Ok(item.accepted)
    }

    pub fn has_any_accepted(&self) -> bool {
        self.items.iter().any(|s| s.accepted)
    }

    /// The accepted items, in store order.
    pub fn accepted(&self) -> Vec<Suggestion> {
        self.items.iter().filter(|s| s.accepted).cloned().collect()
    }

    #[cfg(test)]
    pub fn items(&self) -> &[Suggestion] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::optimization::Impact;

    fn suggestion(section: &str, suggested: &str) -> Suggestion {
        Suggestion {
            section: section.to_string(),
            kind: "add_keyword".to_string(),
            original: "Current skills".to_string(),
            suggested: suggested.to_string(),
            reason: "Listed in the job requirements".to_string(),
            impact: Impact::High,
            accepted: false,
        }
    }

    fn store_with(items: Vec<Suggestion>) -> SuggestionStore {
        let mut store = SuggestionStore::new();
        store.replace(items);
        store
    }

    #[test]
    fn test_toggle_twice_restores_flag() {
        let mut store = store_with(vec![suggestion("skills", "Docker")]);
        assert!(store.toggle(0).unwrap());
        assert!(!store.toggle(0).unwrap());
        assert!(!store.items()[0].accepted);
    }

    #[test]
    fn test_toggle_leaves_other_items_untouched() {
        let mut store = store_with(vec![
            suggestion("skills", "Docker"),
            suggestion("skills", "Kubernetes"),
            suggestion("skills", "Terraform"),
        ]);
        store.toggle(2).unwrap();
        store.toggle(1).unwrap();
        store.toggle(1).unwrap();
        let flags: Vec<bool> = store.items().iter().map(|s| s.accepted).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_toggle_out_of_range() {
        let mut store = store_with(vec![suggestion("skills", "Docker")]);
        assert_eq!(
            store.toggle(3),
            Err(SuggestionError::OutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_has_any_accepted() {
        let mut store = store_with(vec![suggestion("skills", "Docker")]);
        assert!(!store.has_any_accepted());
        store.toggle(0).unwrap();
        assert!(store.has_any_accepted());
    }

    #[test]
    fn test_replace_ports_acceptance_by_value_not_index() {
        let mut store = store_with(vec![
            suggestion("skills", "Docker"),
            suggestion("skills", "Kubernetes"),
        ]);
        store.toggle(1).unwrap(); // accept Kubernetes

        // Server reorders and adds an item.
        store.replace(vec![
            suggestion("skills", "Kubernetes"),
            suggestion("experience", "Led migration"),
            suggestion("skills", "Docker"),
        ]);

        let accepted: Vec<&str> = store
            .items()
            .iter()
            .filter(|s| s.accepted)
            .map(|s| s.suggested.as_str())
            .collect();
        assert_eq!(accepted, vec!["Kubernetes"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_replace_does_not_port_onto_changed_suggestion() {
        let mut store = store_with(vec![suggestion("skills", "Docker")]);
        store.toggle(0).unwrap();
        store.replace(vec![suggestion("skills", "Docker Compose")]);
        assert!(!store.has_any_accepted());
    }

    #[test]
    fn test_replace_ignores_server_sent_accepted_flag() {
        let mut incoming = suggestion("skills", "Docker");
        incoming.accepted = true;
        let store = store_with(vec![incoming]);
        assert!(!store.has_any_accepted());
    }

    #[test]
    fn test_replace_drops_repeated_changes() {
        let store = store_with(vec![
            suggestion("skills", "Docker"),
            suggestion("skills", "Docker"),
        ]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_accepted_returns_only_selected_in_order() {
        let mut store = store_with(vec![
            suggestion("skills", "A"),
            suggestion("skills", "B"),
            suggestion("skills", "C"),
        ]);
        store.toggle(2).unwrap();
        store.toggle(0).unwrap();
        let picked: Vec<String> = store.accepted().into_iter().map(|s| s.suggested).collect();
        assert_eq!(picked, vec!["A", "C"]);
    }
}
