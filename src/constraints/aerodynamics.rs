//! Per-particle aerodynamic constraints.
//!
//! One row per initial cloth vertex, carrying the surface area the particle
//! represents plus drag and lift coefficients. The external solver consumes
//! these during its force pass; tearing never touches them, since newly
//! split particles inherit the original particle's surface contribution.

/// A single batch covering every initial vertex.
#[derive(Debug, Clone, Default)]
pub struct AerodynamicBatch {
    particles: Vec<usize>,
    areas: Vec<f32>,
    drag_coefficients: Vec<f32>,
    lift_coefficients: Vec<f32>,
}

impl AerodynamicBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn add(&mut self, particle: usize, area: f32, drag: f32, lift: f32) {
        self.particles.push(particle);
        self.areas.push(area);
        self.drag_coefficients.push(drag);
        self.lift_coefficients.push(lift);
    }

    /// `(particle, area, drag, lift)` row at `index`.
    pub fn row(&self, index: usize) -> (usize, f32, f32, f32) {
        (
            self.particles[index],
            self.areas[index],
            self.drag_coefficients[index],
            self.lift_coefficients[index],
        )
    }
}
