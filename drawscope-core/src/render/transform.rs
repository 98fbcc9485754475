//! Program transforms and the world-to-screen projection.

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

use crate::frame::Point;

/// Column-major 4×4 matrix as uploaded by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform(pub [f32; 16]);

impl Default for Transform {
    fn default() -> Self {
        let mut m = [0f32; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Self(m)
    }
}

impl Transform {
    pub fn matrix(&self) -> glm::Mat4 {
        glm::Mat4::from_column_slice(&self.0)
    }

    /// Maps a vertex position to pixel coordinates.
    ///
    /// The position is transformed into normalized device coordinates and
    /// then scaled from `[-1, 1]` onto `[0, 2 * half]` on both axes.
    pub fn to_screen(&self, x: f32, y: f32, half_width: f32, half_height: f32) -> Point {
        let ndc = self.matrix() * glm::vec4(x, y, 0.0, 1.0);
        Point {
            x: (ndc.x + 1.0) * half_width,
            y: (ndc.y + 1.0) * half_height,
        }
    }
}
