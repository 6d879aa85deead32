use kurbo::Vec2;

use crate::{
    color::{BLUE, GREEN, PURPLE, RED, Rgba8, YELLOW},
    core::{hash_unit_f64, stable_hash64},
};

/// Vertical gap between levels, world units.
const LEVEL_SPACING: f64 = 1.25;
/// Horizontal gap between adjacent nodes in a level.
const NODE_SPACING: f64 = 1.5;
/// y of the root level.
const ROOT_Y: f64 = 2.5;
/// Nodes per level, root first.
const LEVEL_SIZES: [usize; 5] = [1, 3, 4, 5, 5];

/// Directed edges by node index: the hierarchical level-to-level fan-out
/// plus the cross-connections that make the graph look tangled.
pub const EDGES: [(usize, usize); 34] = [
    // root to level 2
    (0, 1),
    (0, 2),
    (0, 3),
    // level 2 to level 3
    (1, 4),
    (1, 5),
    (2, 5),
    (2, 6),
    (3, 6),
    (3, 7),
    // level 3 to level 4
    (4, 8),
    (4, 9),
    (5, 9),
    (5, 10),
    (6, 10),
    (6, 11),
    (7, 11),
    (7, 12),
    // level 4 to level 5
    (8, 13),
    (8, 14),
    (9, 14),
    (9, 15),
    (10, 15),
    (10, 16),
    (11, 16),
    (11, 17),
    (12, 17),
    // cross-connections
    (2, 4),
    (2, 7),
    (5, 8),
    (6, 12),
    (9, 13),
    (10, 17),
    (14, 16),
    (15, 17),
];

/// Segment color choices for composite nodes.
const SEGMENT_PALETTE: [Rgba8; 5] = [BLUE, RED, YELLOW, GREEN, PURPLE];

/// The fixed 18-node tiered program graph: node centers level by level,
/// root at the top, lower levels fanning out beneath it.
pub fn node_positions() -> Vec<Vec2> {
    let mut positions = Vec::with_capacity(LEVEL_SIZES.iter().sum());
    let mut y = ROOT_Y;
    for &count in &LEVEL_SIZES {
        let mid = (count as f64 - 1.0) / 2.0;
        for i in 0..count {
            positions.push(Vec2::new((i as f64 - mid) * NODE_SPACING, y));
        }
        y -= LEVEL_SPACING;
    }
    positions
}

/// Level index (0-based, root = 0) for each node.
pub fn node_levels() -> Vec<usize> {
    let mut levels = Vec::with_capacity(LEVEL_SIZES.iter().sum());
    for (level, &count) in LEVEL_SIZES.iter().enumerate() {
        levels.extend(std::iter::repeat_n(level, count));
    }
    levels
}

/// Deterministic pie-segment colors for a node: 2-5 palette entries chosen
/// and ordered by the seeded hash stream.
pub fn node_segment_colors(seed: u64, node_index: usize) -> Vec<Rgba8> {
    let tag = format!("graph-node-{node_index}");
    let count = 2 + (stable_hash64(seed, &tag) % 4) as usize; // 2..=5

    let mut indices: Vec<usize> = (0..SEGMENT_PALETTE.len()).collect();
    // Fisher-Yates driven by the hash stream.
    for i in (1..indices.len()).rev() {
        let j_tag = format!("{tag}-swap-{i}");
        let j = (stable_hash64(seed, &j_tag) % (i as u64 + 1)) as usize;
        indices.swap(i, j);
    }

    indices
        .into_iter()
        .take(count)
        .map(|i| SEGMENT_PALETTE[i])
        .collect()
}

/// Deterministic small jitter in `-half..half` for a tagged choice.
pub fn jitter(seed: u64, tag: &str, half: f64) -> f64 {
    (hash_unit_f64(stable_hash64(seed, tag)) - 0.5) * 2.0 * half
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eighteen_nodes_in_five_levels() {
        let positions = node_positions();
        let levels = node_levels();
        assert_eq!(positions.len(), 18);
        assert_eq!(levels.len(), 18);
        assert_eq!(levels.iter().filter(|&&l| l == 0).count(), 1);
        assert_eq!(levels.iter().filter(|&&l| l == 4).count(), 5);
    }

    #[test]
    fn root_is_centered_on_top() {
        let positions = node_positions();
        assert_eq!(positions[0], Vec2::new(0.0, 2.5));
        // All other nodes sit strictly below the root.
        assert!(positions[1..].iter().all(|p| p.y < 2.5));
    }

    #[test]
    fn levels_are_evenly_spaced_and_centered() {
        let positions = node_positions();
        let levels = node_levels();
        for (p, &l) in positions.iter().zip(&levels) {
            assert!((p.y - (ROOT_Y - l as f64 * LEVEL_SPACING)).abs() < 1e-12);
        }
        // Each level's x positions are symmetric about zero.
        for level in 0..LEVEL_SIZES.len() {
            let xs: Vec<f64> = positions
                .iter()
                .zip(&levels)
                .filter(|&(_, &l)| l == level)
                .map(|(p, _)| p.x)
                .collect();
            let sum: f64 = xs.iter().sum();
            assert!(sum.abs() < 1e-9);
        }
    }

    #[test]
    fn edges_reference_valid_nodes_and_point_downward_or_sideways() {
        let levels = node_levels();
        assert_eq!(EDGES.len(), 34);
        for &(a, b) in &EDGES {
            assert!(a < 18 && b < 18);
            assert_ne!(a, b);
            // No edge climbs back up the hierarchy.
            assert!(levels[a] <= levels[b]);
        }
    }

    #[test]
    fn segment_colors_are_deterministic_and_bounded() {
        for node in 0..18 {
            let a = node_segment_colors(42, node);
            let b = node_segment_colors(42, node);
            assert_eq!(a, b);
            assert!((2..=5).contains(&a.len()));
        }
        // Different seeds produce a different overall assignment.
        let all_a: Vec<_> = (0..18).map(|n| node_segment_colors(1, n)).collect();
        let all_b: Vec<_> = (0..18).map(|n| node_segment_colors(2, n)).collect();
        assert_ne!(all_a, all_b);
    }

    #[test]
    fn jitter_stays_in_range() {
        for i in 0..32 {
            let v = jitter(9, &format!("t{i}"), 0.15);
            assert!(v.abs() <= 0.15);
        }
    }
}
