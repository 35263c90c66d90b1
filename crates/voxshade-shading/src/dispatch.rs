//! Data-parallel shading of fragment buffers.
//!
//! Output slot `i` is written only by the task shading input `i`, so the
//! result does not depend on scheduling and matches [`shade_sequential`].

use std::time::Instant;

use glam::Vec4;
use rayon::prelude::*;
use voxshade_materials::SurfacePoint;

use crate::frame::{FrameError, FrameInputs, shade_fragment};

const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Shade every point on the calling thread.
pub fn shade_sequential(frame: &FrameInputs, points: &[SurfacePoint]) -> Vec<Vec4> {
    points.iter().map(|p| shade_fragment(frame, p)).collect()
}

/// Shades fragment buffers on a dedicated worker pool.
pub struct FragmentDispatcher {
    pool: rayon::ThreadPool,
    chunk_size: usize,
}

impl FragmentDispatcher {
    /// Build a pool with `worker_threads` workers (0 means one per core).
    ///
    /// `chunk_size` is the number of fragments per task; 0 selects the default.
    pub fn new(worker_threads: usize, chunk_size: usize) -> Result<Self, FrameError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|idx| format!("shade-{idx}"))
            .build()?;
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        tracing::info!(
            workers = pool.current_num_threads(),
            chunk_size,
            "fragment dispatcher ready"
        );
        Ok(Self { pool, chunk_size })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Shade `points` into a new buffer.
    pub fn shade(&self, frame: &FrameInputs, points: &[SurfacePoint]) -> Vec<Vec4> {
        let mut output = vec![Vec4::ZERO; points.len()];
        self.shade_chunks(frame, points, &mut output);
        output
    }

    /// Shade `points` into `output`, which must have the same length.
    pub fn shade_into(
        &self,
        frame: &FrameInputs,
        points: &[SurfacePoint],
        output: &mut [Vec4],
    ) -> Result<(), FrameError> {
        if points.len() != output.len() {
            return Err(FrameError::BufferLengthMismatch {
                points: points.len(),
                output: output.len(),
            });
        }
        self.shade_chunks(frame, points, output);
        Ok(())
    }

    fn shade_chunks(&self, frame: &FrameInputs, points: &[SurfacePoint], output: &mut [Vec4]) {
        let start = Instant::now();
        let chunk = self.chunk_size;
        self.pool.install(|| {
            output
                .par_chunks_mut(chunk)
                .zip(points.par_chunks(chunk))
                .for_each(|(out, input)| {
                    for (slot, point) in out.iter_mut().zip(input) {
                        *slot = shade_fragment(frame, point);
                    }
                });
        });
        tracing::debug!(
            fragments = points.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "shaded fragment buffer"
        );
    }
}
