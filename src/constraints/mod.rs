//! Constraint batches built over the cloth topology.
//!
//! Constraints are grouped into batches by graph coloring so that no two
//! constraints in a batch share a particle. Each batch keeps an active
//! prefix `[0, active_count)`; activating or deactivating a constraint
//! swaps it across that boundary without invalidating the stable ids
//! stored in the half-edge → constraint map.

pub mod aerodynamics;
pub mod bending;
pub mod distance;

pub use aerodynamics::AerodynamicBatch;
pub use bending::BendBatch;
pub use distance::DistanceBatch;

/// Stable reference to a distance constraint: batch number plus the
/// constraint's creation id within that batch. Ids survive the swaps
/// performed by activation and deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintRef {
    pub batch: usize,
    pub constraint: usize,
}
