//! Role hierarchy: child → parent edges with cycle detection
//!
//! A hierarchy maps each child role to an ordered list of parent roles.
//! Permission resolution walks these edges transitively, so the graph must
//! be acyclic; [`RoleHierarchy::validated`] rejects any mapping containing a
//! cycle before it can be installed. A rejected mapping never partially
//! applies — callers only swap in fully validated values.
//!
//! Parents do not have to exist in the configuration at validation time.
//! An edge to an undefined role resolves to "no permissions" at query time,
//! not to a hierarchy error.

use crate::error::{AuthzError, Result};
use crate::validate::validate_identifier;
use std::collections::{HashMap, HashSet};

/// Validated, acyclic child → parents mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleHierarchy {
    edges: HashMap<String, Vec<String>>,
}

impl RoleHierarchy {
    /// An empty hierarchy (no inheritance)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate a mapping and build a hierarchy from it.
    ///
    /// Every child and parent identifier is validated, then each child key
    /// is traversed depth-first over the parent edges. Revisiting a node
    /// that is still on the traversal stack is a cycle; a self-reference is
    /// the 1-cycle case of the same check.
    ///
    /// Parent order within each list is preserved: resolution consults
    /// parents in declared order and short-circuits on the first grant.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidInput`] for malformed identifiers,
    /// [`AuthzError::CircularHierarchy`] naming the role at which a cycle
    /// was detected.
    pub fn validated(mapping: HashMap<String, Vec<String>>) -> Result<Self> {
        for (child, parents) in &mapping {
            validate_identifier(child, "role")?;
            for parent in parents {
                validate_identifier(parent, "parent role")?;
            }
        }

        // DFS from every child key. `on_stack` catches back edges (cycles),
        // `done` skips roles already proven cycle-free.
        let mut done: HashSet<&str> = HashSet::new();
        for child in mapping.keys() {
            let mut on_stack: HashSet<&str> = HashSet::new();
            Self::check_acyclic(child, &mapping, &mut on_stack, &mut done)?;
        }

        Ok(Self { edges: mapping })
    }

    fn check_acyclic<'a>(
        role: &'a str,
        mapping: &'a HashMap<String, Vec<String>>,
        on_stack: &mut HashSet<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Result<()> {
        if done.contains(role) {
            return Ok(());
        }
        if !on_stack.insert(role) {
            return Err(AuthzError::CircularHierarchy {
                role: role.to_string(),
            });
        }

        if let Some(parents) = mapping.get(role) {
            for parent in parents {
                Self::check_acyclic(parent, mapping, on_stack, done)?;
            }
        }

        on_stack.remove(role);
        done.insert(role);
        Ok(())
    }

    /// Parents of a role, in declared order. Empty when the role has no
    /// hierarchy entry.
    pub fn parents(&self, role: &str) -> &[String] {
        self.edges.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Children that list `role` as a parent.
    ///
    /// Used by role removal to report dangling references.
    pub fn children_of(&self, role: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, parents)| parents.iter().any(|p| p == role))
            .map(|(child, _)| child.as_str())
            .collect()
    }

    /// Number of child entries
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether any inheritance edges exist
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
