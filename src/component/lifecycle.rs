use crate::error::{LifecycleError, Result};

/// Construction state of a component. Strictly linear, no re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    /// Freshly constructed.
    #[default]
    Unbuilt,
    /// Parameters read.
    Populated,
    /// Frame computed.
    Framed,
    /// Surfaces emitted.
    Surfaced,
    /// Cells registered.
    Objected,
    /// Links published; read-only from outside.
    Built,
    /// A stage failed; the component cannot be built any further.
    Failed,
}

/// One step of the construction sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Populate,
    CreateUnitVector,
    CreateSurfaces,
    CreateObjects,
    CreateLinks,
}

impl Stage {
    /// All stages in execution order.
    pub const ORDER: [Stage; 5] = [
        Stage::Populate,
        Stage::CreateUnitVector,
        Stage::CreateSurfaces,
        Stage::CreateObjects,
        Stage::CreateLinks,
    ];

    /// State the component must be in to enter this stage.
    #[must_use]
    pub fn requires(self) -> BuildState {
        match self {
            Self::Populate => BuildState::Unbuilt,
            Self::CreateUnitVector => BuildState::Populated,
            Self::CreateSurfaces => BuildState::Framed,
            Self::CreateObjects => BuildState::Surfaced,
            Self::CreateLinks => BuildState::Objected,
        }
    }

    /// State the component is in after this stage succeeds.
    #[must_use]
    pub fn produces(self) -> BuildState {
        match self {
            Self::Populate => BuildState::Populated,
            Self::CreateUnitVector => BuildState::Framed,
            Self::CreateSurfaces => BuildState::Surfaced,
            Self::CreateObjects => BuildState::Objected,
            Self::CreateLinks => BuildState::Built,
        }
    }

    /// Name used in errors and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Populate => "populate",
            Self::CreateUnitVector => "create_unit_vector",
            Self::CreateSurfaces => "create_surfaces",
            Self::CreateObjects => "create_objects",
            Self::CreateLinks => "create_links",
        }
    }
}

/// Explicit state tag checked at every stage transition.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: BuildState,
}

impl Lifecycle {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Checks that `stage` may start now.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error if the stage is out of order.
    pub fn begin(&self, component: &str, stage: Stage) -> Result<()> {
        self.check(component, stage)?;
        tracing::debug!(component, stage = stage.name(), "entering stage");
        Ok(())
    }

    /// Checks that the component is inside `stage`, i.e. in the state the
    /// stage starts from.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error in any other state.
    pub fn check(&self, component: &str, stage: Stage) -> Result<()> {
        if self.state != stage.requires() {
            return Err(self.refuse(component, stage.name(), stage.requires()));
        }
        Ok(())
    }

    /// Checks that no cell has been created yet.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error from `Objected` on, or after a failure.
    pub fn check_before_objects(&self, component: &str, action: &'static str) -> Result<()> {
        match self.state {
            BuildState::Unbuilt
            | BuildState::Populated
            | BuildState::Framed
            | BuildState::Surfaced => Ok(()),
            _ => Err(self.refuse(component, action, BuildState::Surfaced)),
        }
    }

    fn refuse(
        &self,
        component: &str,
        action: &'static str,
        expected: BuildState,
    ) -> crate::error::CellforgeError {
        LifecycleError {
            component: component.to_owned(),
            stage: action,
            expected,
            actual: self.state,
        }
        .into()
    }

    /// Records successful completion of `stage`.
    pub fn complete(&mut self, stage: Stage) {
        self.state = stage.produces();
    }

    /// Marks the component as unbuildable.
    pub fn fail(&mut self) {
        self.state = BuildState::Failed;
    }
}
