//! Latent-grid sampling and manifold composition
//!
//! A manifold image tiles one rendered hand per latent-grid cell so the pose
//! variation learned by the decoder can be inspected at a glance. Composition
//! is a single-pass, stateless batch pipeline: sample the grid, decode once,
//! build vertices once, then render and paste tile by tile.

use std::fs;
use std::path::Path;

use glam::Vec3;
use image::{imageops, RgbImage};

use crate::annotate;
use crate::error::{RenderError, RenderResult};
use crate::model::{self, HandModel, Latent, PoseDecoder};
use crate::renderer::HandRenderer;

/// Sampling parameters for a manifold composition
#[derive(Debug, Clone)]
pub struct ManifoldConfig {
    /// Latent-space interval sampled on both axes, `[lo, hi)`
    pub bounds: (f32, f32),
    /// Samples per axis; the grid holds `num_samples^2` cells
    pub num_samples: usize,
    /// Base color of the rendered hands, RGB in [0, 1]
    pub color: [f32; 3],
    /// Log per-tile progress and stamp each tile with its sample index
    pub verbose: bool,
}

impl Default for ManifoldConfig {
    fn default() -> Self {
        Self {
            bounds: (-4.0, 4.0),
            num_samples: 16,
            color: [1.0, 0.0, 0.0],
            verbose: false,
        }
    }
}

/// Uniform 2-D grid of latent codes over `[lo, hi) x [lo, hi)`, flattened in
/// row-major order.
pub struct LatentGrid {
    points: Vec<Latent>,
    cols: usize,
    rows: usize,
}

impl LatentGrid {
    pub fn new(bounds: (f32, f32), num_samples: usize) -> Self {
        let (lo, hi) = bounds;
        let step = (hi - lo) / num_samples as f32;

        let mut points = Vec::with_capacity(num_samples * num_samples);
        for xi in 0..num_samples {
            for yi in 0..num_samples {
                points.push([lo + xi as f32 * step, lo + yi as f32 * step]);
            }
        }

        Self {
            points,
            cols: num_samples,
            rows: num_samples,
        }
    }

    /// Flattened sample coordinates, one latent code per grid cell.
    pub fn points(&self) -> &[Latent] {
        &self.points
    }

    /// Grid shape as `(cols, rows)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
}

impl HandRenderer {
    /// Render a posed-hand manifold sampled from the decoder's latent space.
    ///
    /// The decoder and the hand model are each invoked exactly once with the
    /// full flattened batch. A collaborator failure aborts the composition
    /// with no partial output. The composed canvas is returned, and written to
    /// `output_path` when one is given.
    pub fn render_manifold(
        &mut self,
        decoder: &dyn PoseDecoder,
        hand_model: &dyn HandModel,
        config: &ManifoldConfig,
        output_path: Option<&Path>,
    ) -> RenderResult<RgbImage> {
        let grid = LatentGrid::new(config.bounds, config.num_samples);
        log::debug!(
            "sampling {} latent codes over [{}, {})",
            grid.points().len(),
            config.bounds.0,
            config.bounds.1
        );

        let deltas = decoder.decode(grid.points()).map_err(RenderError::Decoder)?;
        let poses = model::assemble_poses(&deltas, &hand_model.mean_pose());
        let shapes = model::zero_shapes(poses.len());
        let vertices = hand_model
            .vertices(&shapes, &poses)
            .map_err(RenderError::Model)?;

        self.render_hands(&vertices, grid.dims(), config.color, config.verbose, output_path)
    }

    /// Tile a batch of rendered hands onto one canvas.
    ///
    /// The canvas measures `image_size * cols` by `image_size * rows` pixels;
    /// the tile for grid cell `(x, y)` lands at `(x * image_size,
    /// y * image_size)`. Cells whose sample index falls past the end of the
    /// batch are left at the canvas fill. When an output path is given its
    /// missing parent directories are created before the image is written.
    pub fn render_hands(
        &mut self,
        vertices: &[Vec<Vec3>],
        dims: (usize, usize),
        color: [f32; 3],
        verbose: bool,
        output_path: Option<&Path>,
    ) -> RenderResult<RgbImage> {
        let (cols, rows) = dims;
        let tile = self.image_size() as usize;
        let mut canvas = RgbImage::new((tile * cols) as u32, (tile * rows) as u32);

        let batch_size = vertices.len();
        for x in 0..cols {
            for y in 0..rows {
                let model_index = y * rows + x;
                if model_index >= batch_size {
                    continue;
                }

                if verbose {
                    log::info!("rendering manifold tile at {x}, {y}");
                }

                let mut tile_image = self.render_hand(&vertices[model_index], color)?;
                if verbose {
                    annotate::draw_index(&mut tile_image, model_index);
                }

                imageops::replace(&mut canvas, &tile_image, (x * tile) as i64, (y * tile) as i64);
            }
        }
        log::debug!("manifold composed from {batch_size} samples into a {cols}x{rows} grid");

        if let Some(path) = output_path {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            canvas.save(path)?;
            log::info!("manifold written to {}", path.display());
        }

        Ok(canvas)
    }
}
