//! App name ↔ app id bindings learned from `app|installed` events.

use std::collections::HashMap;

/// Result of binding a name to an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOutcome {
    /// The name had never been bound before.
    pub new_name: bool,
    /// Names whose claim to the id was cleared.
    pub unbound: Vec<String>,
}

/// Current id of every known app name, plus the last name to claim each id.
///
/// Names are never forgotten. When an id moves to another name, the previous
/// holder keeps its entry with an empty id so later traffic for that id is
/// attributed to the new name only.
#[derive(Debug, Clone, Default)]
pub struct AppIdentityMap {
    /// `(name, id)` in first-seen order.
    bindings: Vec<(String, String)>,
    by_name: HashMap<String, usize>,
    owner_of_id: HashMap<String, String>,
}

impl AppIdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `id`, clearing any other name holding `id`.
    pub fn bind(&mut self, name: &str, id: &str) -> BindOutcome {
        let new_name = !self.by_name.contains_key(name);
        let mut unbound = Vec::new();

        match self.owner_of_id.get(id) {
            None => {
                self.owner_of_id.insert(id.to_string(), name.to_string());
            }
            Some(owner) if owner != name => {
                for (other, other_id) in self.bindings.iter_mut() {
                    if other_id.as_str() == id && other.as_str() != name {
                        other_id.clear();
                        unbound.push(other.clone());
                    }
                }
                self.owner_of_id.insert(id.to_string(), name.to_string());
            }
            Some(_) => {}
        }

        match self.by_name.get(name) {
            Some(&idx) => self.bindings[idx].1 = id.to_string(),
            None => {
                self.by_name.insert(name.to_string(), self.bindings.len());
                self.bindings.push((name.to_string(), id.to_string()));
            }
        }

        BindOutcome { new_name, unbound }
    }

    /// First name, in first-seen order, currently bound to `id`.
    pub fn resolve(&self, id: &str) -> Option<&str> {
        if id.is_empty() {
            return None;
        }
        self.bindings
            .iter()
            .find(|(_, bound)| bound.as_str() == id)
            .map(|(name, _)| name.as_str())
    }

    /// Id currently bound to `name`; empty when the name was unbound.
    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(|&idx| self.bindings[idx].1.as_str())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}
