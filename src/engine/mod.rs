// Engine module: tree generation pipeline plus the wgpu/egui display layer.
//
//   config → skeleton → rings → bark / overlay → tree   (pure, CPU only)
//   camera, input, mesh, renderer, debug_overlay        (window and GPU)

pub mod bark;
pub mod camera;
pub mod config;
pub mod debug_overlay;
pub mod error;
pub mod geometry;
pub mod input;
pub mod mesh;
pub mod overlay;
pub mod renderer;
pub mod rings;
pub mod skeleton;
pub mod tree;

// Re-export commonly used items
pub use config::{DrawFlags, TreeConfig, ViewMode};
pub use error::{TreeError, TreeResult};
pub use tree::{Tree, TreeBuilder};
