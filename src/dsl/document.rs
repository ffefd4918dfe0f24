//! The compiled script: an ordered action list plus a tag index.

use std::collections::HashMap;

use super::action::Action;

/// A fully compiled script, immutable once built.
///
/// Action order is source order. `tags` maps each tag name to the index of
/// its `TAG` action in `actions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptDocument {
    actions: Vec<Action>,
    tags: HashMap<String, usize>,
}

impl ScriptDocument {
    pub fn new(actions: Vec<Action>, tags: HashMap<String, usize>) -> Self {
        Self { actions, tags }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Index of the `TAG` action named `name`.
    pub fn tag(&self, name: &str) -> Option<usize> {
        self.tags.get(name).copied()
    }

    pub fn tags(&self) -> &HashMap<String, usize> {
        &self.tags
    }

    /// Human-readable listing of every action, one per line.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for action in &self.actions {
            out.push_str(&action.to_string());
            out.push('\n');
        }
        out
    }
}
