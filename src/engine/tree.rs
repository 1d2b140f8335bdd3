// TreeBuilder: one-shot pipeline from config to render-ready tables.
//
//   Skeleton::generate → build_rings → build_stick_bark / build_joint_bark → colours
//
// The builder owns the random stream, so two builders never share state and a
// seed fully determines the tree.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::bark::{build_joint_bark, build_stick_bark, BarkMesh};
use super::config::TreeConfig;
use super::error::TreeResult;
use super::overlay;
use super::rings::{build_rings, RingTable};
use super::skeleton::Skeleton;

/// Everything the renderer needs for one tree. Immutable once built.
#[derive(Debug, Clone)]
pub struct Tree {
    pub seed:       u64,
    pub skeleton:   Skeleton,
    pub rings:      RingTable,
    pub stick_bark: BarkMesh,
    pub joint_bark: BarkMesh,
    /// One RGB colour per ring point, shared by both bark surfaces.
    pub colours:    Vec<[f32; 3]>,

    pub skeleton_lines: Vec<u32>,
    pub ring_loops:     Vec<u32>,
    pub stick_lines:    Vec<u32>,
}

impl Tree {
    pub fn joint_triangle_count(&self) -> usize {
        self.joint_bark.index_count() / 3
    }
}

pub struct TreeBuilder {
    config: TreeConfig,
    seed:   u64,
    rng:    StdRng,
}

impl TreeBuilder {
    /// Validate `config` and seed the random stream. Without a configured seed
    /// a fresh one is drawn; it is logged so the tree can be rebuilt.
    pub fn new(config: TreeConfig) -> TreeResult<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            config,
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn build(mut self) -> Tree {
        info!("Growing tree (seed {}, max depth {})", self.seed, self.config.max_depth);

        let mut skeleton = Skeleton::generate(&mut self.rng, &self.config);
        debug!(
            "Skeleton: {} segments, {} leaves",
            skeleton.segment_count(),
            skeleton.leaves.len()
        );

        let rings = build_rings(&mut skeleton, self.config.max_ring_corners);
        debug!("Rings: {} points", rings.len());

        let stick_bark = build_stick_bark(&skeleton, &rings);
        let joint_bark = build_joint_bark(&skeleton, &rings);

        let colours = (0..rings.len())
            .map(|_| [self.rng.r#gen(), self.rng.r#gen(), self.rng.r#gen()])
            .collect();

        let tree = Tree {
            seed: self.seed,
            skeleton_lines: overlay::skeleton_lines(&skeleton),
            ring_loops: overlay::ring_loops(&skeleton),
            stick_lines: overlay::stick_lines(&skeleton),
            skeleton,
            rings,
            stick_bark,
            joint_bark,
            colours,
        };

        info!(
            "Tree ready: {} segments, {} ring points, {} strip indices, {} joint triangles",
            tree.skeleton.segment_count(),
            tree.rings.len(),
            tree.stick_bark.index_count(),
            tree.joint_triangle_count(),
        );
        tree
    }
}
