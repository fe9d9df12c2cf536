use crate::error::{ReferenceError, Result};

/// Named groups of cell numbers owned by one component.
///
/// Tags keep their insertion order; each tag may hold several cells
/// (one per layer, say).
#[derive(Debug, Clone)]
pub struct CellMap {
    owner: String,
    groups: Vec<(String, Vec<i32>)>,
}

impl CellMap {
    /// Creates an empty map for `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            groups: Vec::new(),
        }
    }

    /// Appends `id` to the cells tagged `tag`.
    pub fn add_cell(&mut self, tag: &str, id: i32) {
        match self.groups.iter_mut().find(|(t, _)| t == tag) {
            Some((_, ids)) => ids.push(id),
            None => self.groups.push((tag.to_owned(), vec![id])),
        }
    }

    /// All cells tagged `tag`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a reference error for an unknown tag.
    pub fn cells(&self, tag: &str) -> Result<&[i32]> {
        self.groups
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, ids)| ids.as_slice())
            .ok_or_else(|| {
                ReferenceError::UnknownCellTag {
                    component: self.owner.clone(),
                    tag: tag.to_owned(),
                }
                .into()
            })
    }

    /// The `index`-th cell tagged `tag`.
    ///
    /// # Errors
    ///
    /// Returns a reference error for an unknown tag or index.
    pub fn cell(&self, tag: &str, index: usize) -> Result<i32> {
        let ids = self.cells(tag)?;
        ids.get(index).copied().ok_or_else(|| {
            ReferenceError::CellIndexOutOfRange {
                component: self.owner.clone(),
                tag: tag.to_owned(),
                index,
                len: ids.len(),
            }
            .into()
        })
    }

    /// Tags in insertion order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(t, _)| t.as_str())
    }

    /// Every cell in the map, ascending and without duplicates.
    #[must_use]
    pub fn all_cells(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .groups
            .iter()
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Returns `true` if no cell has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
