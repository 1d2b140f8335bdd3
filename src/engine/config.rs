// Tree generation and display configuration.
//
// Defaults reproduce the stock tree: a vertical trunk at the origin, ten
// levels of branching, joints capped at eight ring corners.
// A JSON file may override any subset of fields.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::error::{TreeError, TreeResult};

/// Deepest recursion accepted. Segment count grows as 2^depth.
pub const MAX_SUPPORTED_DEPTH: u32 = 16;

/// Which overlays and surfaces are drawn each frame.
/// Every flag is independent of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawFlags {
    pub skeleton:    bool,
    pub rings:       bool,
    pub stick_lines: bool,
    pub stick_bark:  bool,
    pub joint_bark:  bool,
}

impl Default for DrawFlags {
    fn default() -> Self {
        Self {
            skeleton:    false,
            rings:       false,
            stick_lines: false,
            stick_bark:  true,
            joint_bark:  true,
        }
    }
}

/// Flat is an orthographic front view; Perspective is the spinning turntable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    Flat,
    #[default]
    Perspective,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Flat => Self::Perspective,
            Self::Perspective => Self::Flat,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Seed for the tree's random stream. `None` draws (and logs) a fresh one.
    pub seed: Option<u64>,

    /// Base of the trunk.
    pub origin: Vec3,
    /// Trunk heading; need not be normalized.
    pub direction: Vec3,

    /// Mean trunk segment length. Each level multiplies it by `branch_size_factor`.
    pub average_length: f32,
    /// A segment shorter than this ends in a leaf.
    pub min_length: f32,
    /// Recursion depth budget; depth 0 is a single trunk segment.
    pub max_depth: u32,
    pub branch_size_factor: f32,

    /// Upper bound on corners of a joint ring.
    pub max_ring_corners: usize,

    /// Model scale applied by the camera.
    pub zoom_scale: f32,
    pub view_mode: ViewMode,
    pub draw: DrawFlags,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: None,
            origin: Vec3::ZERO,
            direction: Vec3::Y,
            average_length: 0.5,
            min_length: 0.01,
            max_depth: 10,
            branch_size_factor: 0.79,
            max_ring_corners: 8,
            zoom_scale: 2.3,
            view_mode: ViewMode::default(),
            draw: DrawFlags::default(),
        }
    }
}

impl TreeConfig {
    /// Read a JSON config. Missing fields keep their defaults.
    pub fn load(path: &Path) -> TreeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| TreeError::Config {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| TreeError::Config {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values. Nothing is clamped.
    pub fn validate(&self) -> TreeResult<()> {
        fn invalid(msg: String) -> TreeResult<()> {
            Err(TreeError::InvalidConfig(msg))
        }

        if !self.origin.is_finite() {
            return invalid(format!("origin must be finite, got {}", self.origin));
        }
        if !self.direction.is_finite() || self.direction.length_squared() == 0.0 {
            return invalid(format!("direction must be a finite non-zero vector, got {}", self.direction));
        }
        if !(self.average_length.is_finite() && self.average_length > 0.0) {
            return invalid(format!("average_length must be positive, got {}", self.average_length));
        }
        if !(self.min_length.is_finite() && self.min_length > 0.0) {
            return invalid(format!("min_length must be positive, got {}", self.min_length));
        }
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return invalid(format!(
                "max_depth {} exceeds the supported maximum of {MAX_SUPPORTED_DEPTH}",
                self.max_depth
            ));
        }
        if !(self.branch_size_factor > 0.0 && self.branch_size_factor <= 1.0) {
            return invalid(format!("branch_size_factor must lie in (0, 1], got {}", self.branch_size_factor));
        }
        if self.max_ring_corners < 3 {
            return invalid(format!("max_ring_corners must be at least 3, got {}", self.max_ring_corners));
        }
        if !(self.zoom_scale.is_finite() && self.zoom_scale > 0.0) {
            return invalid(format!("zoom_scale must be positive, got {}", self.zoom_scale));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: TreeConfig) {
        match config.validate() {
            Err(TreeError::InvalidConfig(_)) => {}
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(TreeConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_lengths() {
        assert_invalid(TreeConfig { average_length: 0.0, ..Default::default() });
        assert_invalid(TreeConfig { average_length: -1.0, ..Default::default() });
        assert_invalid(TreeConfig { min_length: 0.0, ..Default::default() });
        assert_invalid(TreeConfig { average_length: f32::NAN, ..Default::default() });
    }

    #[test]
    fn rejects_excessive_depth() {
        assert_invalid(TreeConfig { max_depth: MAX_SUPPORTED_DEPTH + 1, ..Default::default() });
        assert!(TreeConfig { max_depth: MAX_SUPPORTED_DEPTH, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn rejects_bad_shape_parameters() {
        assert_invalid(TreeConfig { direction: Vec3::ZERO, ..Default::default() });
        assert_invalid(TreeConfig { branch_size_factor: 1.5, ..Default::default() });
        assert_invalid(TreeConfig { branch_size_factor: 0.0, ..Default::default() });
        assert_invalid(TreeConfig { max_ring_corners: 2, ..Default::default() });
        assert_invalid(TreeConfig { zoom_scale: 0.0, ..Default::default() });
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TreeConfig =
            serde_json::from_str(r#"{ "max_depth": 3, "seed": 7, "draw": { "rings": true } }"#)
                .expect("config should parse");
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.seed, Some(7));
        assert!(config.draw.rings);
        assert!(config.draw.stick_bark, "unspecified flags keep their defaults");
        assert_eq!(config.max_ring_corners, 8);
        assert_eq!(config.direction, Vec3::Y);
    }

    #[test]
    fn view_mode_toggles() {
        assert_eq!(ViewMode::Flat.toggled(), ViewMode::Perspective);
        assert_eq!(ViewMode::Perspective.toggled(), ViewMode::Flat);
    }
}
