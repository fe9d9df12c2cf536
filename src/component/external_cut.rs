use std::collections::BTreeMap;

use crate::error::{ReferenceError, Result};
use crate::geometry::Rule;

/// Named boundary rules supplied by other components to clip this one.
#[derive(Debug, Clone)]
pub struct ExternalCut {
    owner: String,
    cuts: BTreeMap<String, Rule>,
}

impl ExternalCut {
    /// Creates an empty cut set for `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            cuts: BTreeMap::new(),
        }
    }

    /// Sets (or replaces) the cut called `name`.
    pub fn set_cut_surf(&mut self, name: &str, rule: Rule) {
        self.cuts.insert(name.to_owned(), rule);
    }

    /// Returns `true` if a cut called `name` was supplied.
    #[must_use]
    pub fn has_cut(&self, name: &str) -> bool {
        self.cuts.contains_key(name)
    }

    /// The cut called `name`.
    ///
    /// # Errors
    ///
    /// Returns a reference error if no such cut was supplied.
    pub fn rule(&self, name: &str) -> Result<&Rule> {
        self.cuts.get(name).ok_or_else(|| {
            ReferenceError::UnknownCut {
                component: self.owner.clone(),
                name: name.to_owned(),
            }
            .into()
        })
    }

    /// The cut called `name`, or all of space when none was supplied.
    #[must_use]
    pub fn rule_or_all(&self, name: &str) -> Rule {
        self.cuts.get(name).cloned().unwrap_or_default()
    }

    /// Complement of the cut called `name`.
    ///
    /// # Errors
    ///
    /// Returns a reference error if no such cut was supplied.
    pub fn complement(&self, name: &str) -> Result<Rule> {
        Ok(self.rule(name)?.complement())
    }
}
