// src/grid.rs
use std::sync::Arc;

use crate::scene::SceneSlot;
use crate::units::safe_step;

/// Upper bound on lines per axis, whatever the step.
pub const MAX_LINES: u32 = 5000;
/// Height of the overlay above the floor plane, keeps it from z-fighting.
pub const GRID_ELEVATION: f32 = 0.0015;
pub const GRID_COLOR: [f32; 3] = [0x4a as f32 / 255.0, 0x4c as f32 / 255.0, 0x50 as f32 / 255.0];
pub const GRID_OPACITY: f32 = 0.28;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
}

impl GridVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GridVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Number of tile periods along an extent, in `[1, MAX_LINES]`.
pub fn line_count(extent: f64, step: f64) -> u32 {
    let n = (extent / safe_step(step)).round();
    if n.is_nan() {
        return 1;
    }
    n.clamp(1.0, MAX_LINES as f64) as u32
}

/// Line-segment overlay marking tile joints. Vertices come in pairs.
#[derive(Debug, Clone)]
pub struct GridOverlay {
    pub vertices: Vec<GridVertex>,
    /// Tile periods across the room width; `lines_x + 1` lines run along the length.
    pub lines_x: u32,
    /// Tile periods along the room length; `lines_z + 1` lines run across the width.
    pub lines_z: u32,
    pub step_x: f64,
    pub step_z: f64,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl GridOverlay {
    /// Builds the overlay for a `length_m` (Z) by `width_m` (X) room centered on
    /// the origin.
    pub fn build(length_m: f64, width_m: f64, step_x: f64, step_z: f64) -> Self {
        let sx = safe_step(step_x);
        let sz = safe_step(step_z);
        let lines_x = line_count(width_m, sx);
        let lines_z = line_count(length_m, sz);

        let half_w = width_m / 2.0;
        let half_l = length_m / 2.0;
        let y = GRID_ELEVATION;

        let mut vertices = Vec::with_capacity(2 * (lines_x as usize + lines_z as usize + 2));
        for i in 0..=lines_x {
            let x = (-half_w + i as f64 * sx) as f32;
            vertices.push(GridVertex { position: [x, y, -half_l as f32] });
            vertices.push(GridVertex { position: [x, y, half_l as f32] });
        }
        for j in 0..=lines_z {
            let z = (-half_l + j as f64 * sz) as f32;
            vertices.push(GridVertex { position: [-half_w as f32, y, z] });
            vertices.push(GridVertex { position: [half_w as f32, y, z] });
        }

        Self {
            vertices,
            lines_x,
            lines_z,
            step_x: sx,
            step_z: sz,
            color: GRID_COLOR,
            opacity: GRID_OPACITY,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Builds a fresh overlay and attaches it in place of the current one.
pub fn rebuild(
    slot: &SceneSlot<GridOverlay>,
    length_m: f64,
    width_m: f64,
    step_x: f64,
    step_z: f64,
) -> Arc<GridOverlay> {
    let grid = GridOverlay::build(length_m, width_m, step_x, step_z);
    log::debug!(
        "grid rebuilt: {}x{} periods, {} segments",
        grid.lines_x,
        grid.lines_z,
        grid.segment_count()
    );
    slot.attach(grid)
}
