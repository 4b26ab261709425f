//! Greedy graph coloring for constraint batching.
//!
//! Two constraints conflict when they share a particle; constraints with
//! the same color form a batch the external solver can relax in parallel
//! without write conflicts.

/// Assign a color to each constraint so that no two constraints sharing a
/// particle receive the same color.
///
/// `particle_indices` holds `arity` particle ids per constraint (2 for
/// distance constraints, 3 for bend constraints). Returns one color per
/// constraint; colors are dense, starting at 0.
pub fn colorize(particle_indices: &[usize], arity: usize) -> Vec<usize> {
    assert!(arity > 0);
    assert_eq!(particle_indices.len() % arity, 0);

    let constraint_count = particle_indices.len() / arity;
    let mut colors = vec![0usize; constraint_count];

    // colors_used[p] collects the colors already taken by constraints
    // incident to particle p.
    let particle_count = particle_indices.iter().copied().max().map_or(0, |m| m + 1);
    let mut colors_used: Vec<Vec<usize>> = vec![Vec::new(); particle_count];

    for c in 0..constraint_count {
        let particles = &particle_indices[c * arity..(c + 1) * arity];

        // Smallest color unused by any incident particle.
        let mut color = 0;
        while particles.iter().any(|&p| colors_used[p].contains(&color)) {
            color += 1;
        }

        colors[c] = color;
        for &p in particles {
            colors_used[p].push(color);
        }
    }

    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    /// No two constraints with the same color may share a particle.
    fn assert_proper(particle_indices: &[usize], arity: usize, colors: &[usize]) {
        let n = colors.len();
        for a in 0..n {
            for b in (a + 1)..n {
                if colors[a] != colors[b] {
                    continue;
                }
                let pa = &particle_indices[a * arity..(a + 1) * arity];
                let pb = &particle_indices[b * arity..(b + 1) * arity];
                assert!(
                    pa.iter().all(|p| !pb.contains(p)),
                    "constraints {a} and {b} share a particle but both got color {}",
                    colors[a]
                );
            }
        }
    }

    #[test]
    fn chain_needs_two_colors() {
        // 0-1, 1-2, 2-3: adjacent links conflict, alternating colors suffice.
        let particles = [0, 1, 1, 2, 2, 3];
        let colors = colorize(&particles, 2);
        assert_proper(&particles, 2, &colors);
        assert_eq!(colors.iter().max(), Some(&1));
    }

    #[test]
    fn star_needs_degree_colors() {
        // Four edges all sharing particle 0 must all differ.
        let particles = [0, 1, 0, 2, 0, 3, 0, 4];
        let colors = colorize(&particles, 2);
        assert_proper(&particles, 2, &colors);
        assert_eq!(colors.iter().max(), Some(&3));
    }

    #[test]
    fn triples() {
        let particles = [0, 1, 2, 2, 3, 4, 5, 6, 7];
        let colors = colorize(&particles, 3);
        assert_proper(&particles, 3, &colors);
        // Constraint 2 shares nothing, so it can reuse color 0.
        assert_eq!(colors[2], 0);
    }

    #[test]
    fn empty_input() {
        assert!(colorize(&[], 2).is_empty());
    }
}
