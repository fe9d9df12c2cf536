//! Concrete components built on the lifecycle and capability traits.

mod origin;
mod shell;
mod slab;
mod tube;

pub use origin::WorldOrigin;
pub use shell::ShellStack;
pub use slab::LayeredSlab;
pub use tube::LayeredTube;
