//! Owns a tree of components and builds them parent-first.

use std::collections::HashSet;

use slotmap::SlotMap;

use crate::component::{BuildState, Component, FixedComp};
use crate::error::{ReferenceError, Result};
use crate::param::ParamSource;
use crate::registry::Simulation;

slotmap::new_key_type! {
    /// Handle to a component held by an [`Assembly`].
    pub struct ComponentId;
}

struct Node {
    component: Box<dyn Component>,
    parent: Option<(ComponentId, usize)>,
}

/// Arena of components, each optionally attached to a link of another.
///
/// Components without a parent hang from link 0 of [`FixedComp::world`].
#[derive(Default)]
pub struct Assembly {
    nodes: SlotMap<ComponentId, Node>,
    inserted: Vec<ComponentId>,
}

impl Assembly {
    /// Creates an empty assembly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component placed relative to the world anchor.
    pub fn add_root(&mut self, component: impl Component + 'static) -> ComponentId {
        self.insert(Box::new(component), None)
    }

    /// Adds a component placed at link `link_index` of `parent`.
    ///
    /// The index is only checked when the assembly is built.
    ///
    /// # Errors
    ///
    /// Returns a reference error if `parent` is not in this assembly.
    pub fn attach(
        &mut self,
        component: impl Component + 'static,
        parent: ComponentId,
        link_index: usize,
    ) -> Result<ComponentId> {
        if !self.nodes.contains_key(parent) {
            return Err(ReferenceError::UnknownComponent.into());
        }
        Ok(self.insert(Box::new(component), Some((parent, link_index))))
    }

    /// Moves `id` to hang from `parent` at `link_index`.
    ///
    /// # Errors
    ///
    /// Returns a reference error if either component is unknown.
    pub fn reattach(
        &mut self,
        id: ComponentId,
        parent: ComponentId,
        link_index: usize,
    ) -> Result<()> {
        if !self.nodes.contains_key(parent) {
            return Err(ReferenceError::UnknownComponent.into());
        }
        let node = self
            .nodes
            .get_mut(id)
            .ok_or(ReferenceError::UnknownComponent)?;
        node.parent = Some((parent, link_index));
        Ok(())
    }

    fn insert(
        &mut self,
        component: Box<dyn Component>,
        parent: Option<(ComponentId, usize)>,
    ) -> ComponentId {
        let id = self.nodes.insert(Node { component, parent });
        self.inserted.push(id);
        id
    }

    /// Number of components held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the assembly holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Component under `id`.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&dyn Component> {
        self.nodes.get(id).map(|node| node.component.as_ref())
    }

    /// Mutable component under `id`.
    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        let node = self.nodes.get_mut(id)?;
        Some(node.component.as_mut())
    }

    /// First component named `name`, in insertion order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.inserted
            .iter()
            .copied()
            .find(|&id| self.nodes[id].component.name() == name)
    }

    /// Every component after its parent, ties broken by insertion order.
    ///
    /// # Errors
    ///
    /// Returns a reference error naming a component on a parent cycle.
    pub fn build_order(&self) -> Result<Vec<ComponentId>> {
        let mut placed: HashSet<ComponentId> = HashSet::with_capacity(self.nodes.len());
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut pending = self.inserted.clone();
        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|&id| {
                let ready = self.nodes[id]
                    .parent
                    .is_none_or(|(parent, _)| placed.contains(&parent));
                if ready {
                    placed.insert(id);
                    order.push(id);
                }
                !ready
            });
            if pending.len() == before {
                let stuck = self.nodes[pending[0]].component.name().to_owned();
                return Err(ReferenceError::DependencyCycle(stuck).into());
            }
        }
        Ok(order)
    }

    /// Builds every unbuilt component, parents first. Stops at the first
    /// failure; components built before it stay built.
    ///
    /// # Errors
    ///
    /// Returns the first component error, or a reference error on a cycle.
    pub fn build(&mut self, sim: &mut Simulation, params: &dyn ParamSource) -> Result<()> {
        for id in self.build_order()? {
            if self.nodes[id].component.state() == BuildState::Built {
                continue;
            }
            let (anchor, link_index) = match self.nodes[id].parent {
                Some((parent, link_index)) => {
                    (self.nodes[parent].component.fixed().clone(), link_index)
                }
                None => (FixedComp::world(), 0),
            };
            let component = &mut self.nodes[id].component;
            component.create_all(sim, params, &anchor, link_index)?;
            tracing::info!(
                component = component.name(),
                parent = anchor.name(),
                "component built"
            );
        }
        Ok(())
    }
}
