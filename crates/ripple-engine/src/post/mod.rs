//! Image-space post effect: Sobel edge detection followed by a composite.
//!
//! Scenes render into `PostEffectPipeline::scene_view()`. `execute` then runs
//! a compute pass writing edge intensity into a single-channel texture and a
//! full-screen-triangle pass blending scene and edges into the output view.

mod config;
mod error;
mod extent;
mod pipeline;
mod targets;

pub use config::PostEffectConfig;
pub use error::PostEffectError;
pub use extent::{PostExtent, POST_TILE};
pub use pipeline::PostEffectPipeline;
pub use targets::PostTargets;
