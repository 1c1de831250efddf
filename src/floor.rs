// src/floor.rs
// Floor plane geometry and its material description.
//
// Exports:
// - FloorVertex (Pod) with its vertex buffer layout
// - MaterialMaps: the diffuse/normal/roughness maps of the selected tile
// - FloorMaterial + FloorMaterialParams (uniform, matches the floor shader)
// - FloorMesh: plane W x L lying flat on XZ, normal +Y

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::texture::{prepare, TextureGenerator, TextureHandle, TextureSource};

/// Material feature flags (bitmask)
pub mod flags {
    pub const BASE_COLOR_TEX: u32 = 1 << 0;
    pub const NORMAL_TEX: u32 = 1 << 1;
    pub const ROUGHNESS_TEX: u32 = 1 << 2;
    /// Base color is the generated placeholder, not a tile texture.
    pub const PLACEHOLDER: u32 = 1 << 3;
}

/// Tint applied over the placeholder checker when no tile is loaded.
pub const UNTEXTURED_TINT: [f32; 3] = [0x2a as f32 / 255.0, 0x2b as f32 / 255.0, 0x2f as f32 / 255.0];
pub const UNTEXTURED_ROUGHNESS: f32 = 0.7;
pub const FLOOR_METALNESS: f32 = 0.06;
pub const FLOOR_ENV_INTENSITY: f32 = 0.4;

// ─────────────────────────────────────────────────────────────────────────────
// Vertices
// ─────────────────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FloorVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl FloorVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<FloorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Material
// ─────────────────────────────────────────────────────────────────────────────

/// Texture maps of the selected tile design. Any slot may be empty.
#[derive(Debug, Clone, Default)]
pub struct MaterialMaps {
    pub diffuse: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub roughness: Option<TextureHandle>,
}

impl MaterialMaps {
    pub fn is_empty(&self) -> bool {
        self.diffuse.is_none() && self.normal.is_none() && self.roughness.is_none()
    }

    /// Re-applies repeat and rotation to every resolved map.
    pub fn prepare_all(&self, repeat_x: f64, repeat_y: f64, rotation: f64, max_anisotropy: u16) {
        if let Some(map) = &self.diffuse {
            prepare(map, repeat_x, repeat_y, rotation, true, max_anisotropy);
        }
        if let Some(map) = &self.normal {
            prepare(map, repeat_x, repeat_y, rotation, false, max_anisotropy);
        }
        if let Some(map) = &self.roughness {
            prepare(map, repeat_x, repeat_y, rotation, false, max_anisotropy);
        }
    }
}

/// Matches the WGSL `FloorMaterial` uniform.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FloorMaterialParams {
    pub base_color_factor: [f32; 4],
    pub roughness_factor: f32,
    pub metallic_factor: f32,
    pub env_intensity: f32,
    pub flags: u32,
}

#[derive(Debug, Clone)]
pub struct FloorMaterial {
    /// Tile diffuse map, or the placeholder checker.
    pub base_color: TextureHandle,
    pub normal: Option<TextureHandle>,
    pub roughness_map: Option<TextureHandle>,
    pub tint: [f32; 3],
    /// Used when there is no roughness map.
    pub roughness: f32,
    pub metalness: f32,
    pub env_intensity: f32,
}

impl FloorMaterial {
    /// Material for `maps`, falling back to `placeholder` plus a flat dark tint
    /// when no diffuse map is loaded.
    pub fn from_maps(maps: &MaterialMaps, placeholder: &TextureHandle) -> Self {
        let (base_color, tint) = match &maps.diffuse {
            Some(diffuse) => (Arc::clone(diffuse), [1.0, 1.0, 1.0]),
            None => (Arc::clone(placeholder), UNTEXTURED_TINT),
        };
        Self {
            base_color,
            normal: maps.normal.clone(),
            roughness_map: maps.roughness.clone(),
            tint,
            roughness: if maps.roughness.is_some() { 1.0 } else { UNTEXTURED_ROUGHNESS },
            metalness: FLOOR_METALNESS,
            env_intensity: FLOOR_ENV_INTENSITY,
        }
    }

    pub fn uses_placeholder(&self) -> bool {
        self.base_color.source() == TextureSource::Generated
    }

    pub fn params(&self) -> FloorMaterialParams {
        let mut bits = flags::BASE_COLOR_TEX;
        if self.uses_placeholder() {
            bits |= flags::PLACEHOLDER;
        }
        if self.normal.is_some() {
            bits |= flags::NORMAL_TEX;
        }
        if self.roughness_map.is_some() {
            bits |= flags::ROUGHNESS_TEX;
        }
        let [r, g, b] = self.tint;
        FloorMaterialParams {
            base_color_factor: [r, g, b, 1.0],
            roughness_factor: self.roughness,
            metallic_factor: self.metalness,
            env_intensity: self.env_intensity,
            flags: bits,
        }
    }
}

/// Placeholder base color for an untextured floor.
pub fn placeholder_texture() -> TextureHandle {
    Arc::new(TextureGenerator::checkerboard("placeholder:floor", TextureSource::Generated))
}

// ─────────────────────────────────────────────────────────────────────────────
// Mesh
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FloorMesh {
    pub vertices: Vec<FloorVertex>,
    pub indices: Vec<u16>,
    /// Extent along X, meters.
    pub width_m: f64,
    /// Extent along Z, meters.
    pub length_m: f64,
    pub material: FloorMaterial,
}

impl FloorMesh {
    /// A `width_m` by `length_m` plane centered on the origin, rotated -90°
    /// about X so it lies on the XZ plane facing up.
    pub fn new(width_m: f64, length_m: f64, material: FloorMaterial) -> Self {
        let hw = (width_m / 2.0) as f32;
        let hl = (length_m / 2.0) as f32;
        let lay_flat = Mat4::from_rotation_x(-FRAC_PI_2);
        let normal = lay_flat.transform_vector3(Vec3::Z);

        // Upright plane in XY, top row first.
        let corners = [
            ([-hw, hl], [0.0, 1.0]),
            ([hw, hl], [1.0, 1.0]),
            ([-hw, -hl], [0.0, 0.0]),
            ([hw, -hl], [1.0, 0.0]),
        ];
        let vertices = corners
            .iter()
            .map(|&([x, y], uv)| FloorVertex {
                position: lay_flat.transform_point3(Vec3::new(x, y, 0.0)).to_array(),
                normal: normal.to_array(),
                uv,
            })
            .collect();

        Self {
            vertices,
            indices: vec![0, 2, 1, 2, 3, 1],
            width_m,
            length_m,
            material,
        }
    }

    pub fn area_m2(&self) -> f64 {
        self.width_m * self.length_m
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
