//! One observed blob.

use serde::{Deserialize, Serialize};

/// A blob seen by the sensor in one frame: its centroid in image-plane
/// coordinates and the depth reading at that centroid.
///
/// Deserializes from `{"x": .., "y": .., "distance_mm": ..}`; `distance` is
/// accepted as an alias.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    #[serde(alias = "distance")]
    pub distance_mm: f32,
}

impl Detection {
    pub fn new(x: f32, y: f32, distance_mm: f32) -> Self {
        Detection { x, y, distance_mm }
    }
}
