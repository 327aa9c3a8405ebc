//! Error types for hullbonk.
//!
//! Degenerate geometry is not an error: it yields "no intersection" or a
//! zero impulse. Errors are reserved for assembly and bookkeeping faults the
//! caller has to decide about.

use thiserror::Error;

use crate::types::{BodyId, PartId, Quadrant};

pub type Result<T> = std::result::Result<T, GeomError>;

#[derive(Debug, Error)]
pub enum GeomError {
    /// A derived connector between two compound parts cannot be built.
    #[error("cannot connect part {a:?} to part {b:?}: {reason}")]
    InvalidConnection {
        a: PartId,
        b: PartId,
        reason: String,
    },

    /// The index recorded an entity under a quadrant whose bucket does not hold it.
    #[error("spatial index inconsistent: {entity} missing from quadrant {quadrant:?}")]
    IndexInconsistent { entity: String, quadrant: Quadrant },

    #[error("entity {entity} is already indexed")]
    AlreadyIndexed { entity: String },

    #[error("entity {entity} is not indexed")]
    NotIndexed { entity: String },

    #[error("unknown body {0:?}")]
    UnknownBody(BodyId),

    #[error("body {0:?} already exists")]
    DuplicateBody(BodyId),

    #[error("unknown part {0:?}")]
    UnknownPart(PartId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),
}
