//! Taxonomy leaf node model.

use serde::{Deserialize, Serialize};

/// Separator between hierarchy levels in a leaf node name.
const LEVEL_SEPARATOR: char = '/';

/// A terminal taxonomy category.
///
/// Leaf nodes are read-only at runtime. `percentage` is the share of the
/// corpus carrying this label, in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub name: String,
    pub depth: i32,
    pub percentage: f64,
}

impl LeafNode {
    /// Create a leaf node, clamping depth to at least 1 and the weight to `[0, 100]`.
    pub fn new(name: impl Into<String>, depth: i32, percentage: f64) -> Self {
        Self {
            name: name.into(),
            depth: depth.max(1),
            percentage: percentage.clamp(0.0, 100.0),
        }
    }

    /// Depth implied by a hierarchical name (`"Restructuring/Layoffs"` is depth 2).
    pub fn depth_of(name: &str) -> i32 {
        let levels = name
            .split(LEVEL_SEPARATOR)
            .filter(|segment| !segment.trim().is_empty())
            .count();
        (levels as i32).max(1)
    }

    /// Weight rendered with two decimals, as the listing API exposes it.
    pub fn formatted_percentage(&self) -> String {
        format!("{:.2}", self.percentage)
    }
}
