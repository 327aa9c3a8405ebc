//! hullbonk: planar collision geometry for ship hulls (segments, polygons,
//! compound hulls, swept contacts, quadrant broad phase, force split)

pub mod types;
pub mod error;
pub mod api;
pub mod narrowphase;
pub mod segment;
pub mod polygon;
pub mod compound;
pub mod sweep;
pub mod space;
pub mod force;
pub mod events;
pub mod hulls;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{GeomError, Result};
pub use crate::compound::{ArcLimits, Hull, MultiPolygon, PolygonPart};
pub use crate::events::{ModelEvent, SubscriptionId};
pub use crate::force::{Force, Impulse, apply_global_force};
pub use crate::polygon::Polygon;
pub use crate::segment::Segment;
pub use crate::space::SpaceIndex;
pub use crate::sweep::{Moving, TimeframeHit};
pub use crate::world::{CollisionReport, CollisionWorld};
