use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostEffectConfig {
    /// When false the composite passes the scene through unchanged.
    pub enabled: bool,
    /// Gradient magnitude below which a pixel is not an edge.
    pub edge_threshold: f32,
    /// How strongly edges darken the scene, `0..=1` after scaling.
    pub edge_strength: f32,
}

impl Default for PostEffectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            edge_threshold: 0.1,
            edge_strength: 1.0,
        }
    }
}
