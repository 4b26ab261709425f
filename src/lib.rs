//! Cloth topology and runtime tearing for XPBD particle solvers.
//!
//! This crate owns the CPU side of cloth tearing: a half-edge mesh
//! representation of the cloth surface, a blueprint that turns an input
//! triangle mesh into a particle pool plus colored constraint batches, and a
//! runtime actor that decides which overstressed edges tear each substep and
//! mutates topology and constraints accordingly.
//!
//! The constraint solver itself is an external collaborator. It is visible
//! here only through [`solver::SolverState`] (particle positions, inverse
//! masses, the deformable triangle buffer) and through the accumulated
//! Lagrange multipliers stored per distance constraint, which the tearing
//! pass divides by the squared substep time to estimate edge forces.
//!
//! Typical flow:
//!
//! 1. Build a [`blueprint::TearableClothBlueprint`] once from a
//!    [`mesh::TriangleMesh`].
//! 2. Create a [`cloth::TearableCloth`] actor from it; the actor clones the
//!    blueprint so the shared recipe is never mutated.
//! 3. Each substep, after the solver's constraint projection, call
//!    [`cloth::TearableCloth::apply_tearing`] and forward the returned
//!    [`cloth::TearEvent`]s to the mesh renderer.

pub mod blueprint;
pub mod cloth;
pub mod coloring;
pub mod constraints;
pub mod error;
pub mod halfedge;
pub mod math;
pub mod mesh;
pub mod solver;

pub use error::{BuildError, Result};
