pub mod frame;
pub mod link;
pub mod rule;
pub mod surface;

pub use frame::Frame;
pub use link::{LinkPoint, LinkSet};
pub use rule::Rule;
pub use surface::{Cylinder, HalfSpace, Plane, Sphere, SurfaceKind};
