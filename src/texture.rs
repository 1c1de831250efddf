// src/texture.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::{Mat3, Vec2, Vec3};
use image::{ImageBuffer, Rgba, RgbaImage};
use parking_lot::RwLock;

use crate::error::Result;
use crate::units::EPSILON;

/// Shared reference to a cached texture. Identity is the `Arc` pointer.
pub type TextureHandle = Arc<Texture>;

// ─────────────────────────────────────────────────────────────────────────────
// Sampling settings
// ─────────────────────────────────────────────────────────────────────────────

/// Controls how a texture is laid onto a surface and sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSettings {
    pub address_mode: wgpu::AddressMode,
    /// Tiling periods across the surface in U and V.
    pub repeat: Vec2,
    /// Pivot for `rotation`, in UV space.
    pub center: Vec2,
    /// Radians, counter-clockwise in UV space.
    pub rotation: f32,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::FilterMode,
    pub generate_mipmaps: bool,
    pub anisotropy_clamp: u16,
    /// Sample as perceptual (sRGB) color.
    pub srgb: bool,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            address_mode: wgpu::AddressMode::ClampToEdge,
            repeat: Vec2::ONE,
            center: Vec2::ZERO,
            rotation: 0.0,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            generate_mipmaps: true,
            anisotropy_clamp: 1,
            srgb: false,
        }
    }
}

impl TextureSettings {
    pub fn repeating() -> Self {
        Self {
            address_mode: wgpu::AddressMode::Repeat,
            ..Default::default()
        }
    }

    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }

    pub fn with_repeat(mut self, x: f32, y: f32) -> Self {
        self.repeat = Vec2::new(x, y);
        self
    }

    pub fn with_rotation(mut self, center: Vec2, rotation: f32) -> Self {
        self.center = center;
        self.rotation = rotation;
        self
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        if self.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }

    pub fn sampler_descriptor(&self, label: Option<&'static str>) -> wgpu::SamplerDescriptor<'static> {
        wgpu::SamplerDescriptor {
            label,
            address_mode_u: self.address_mode,
            address_mode_v: self.address_mode,
            address_mode_w: self.address_mode,
            mag_filter: self.mag_filter,
            min_filter: self.min_filter,
            mipmap_filter: self.mipmap_filter,
            anisotropy_clamp: self.anisotropy_clamp.max(1),
            ..Default::default()
        }
    }

    /// UV matrix applying repeat and rotation about `center`, column-major.
    ///
    /// Maps mesh UVs to texture UVs: `uv' = M * (u, v, 1)`.
    pub fn uv_transform(&self) -> Mat3 {
        let (s, c) = self.rotation.sin_cos();
        let Vec2 { x: sx, y: sy } = self.repeat;
        let Vec2 { x: cx, y: cy } = self.center;
        Mat3::from_cols(
            Vec3::new(sx * c, -sy * s, 0.0),
            Vec3::new(sx * s, sy * c, 0.0),
            Vec3::new(
                -sx * (c * cx + s * cy) + cx,
                -sy * (-s * cx + c * cy) + cy,
                1.0,
            ),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Core texture struct
// ─────────────────────────────────────────────────────────────────────────────

/// Where the pixels of a texture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSource {
    Loaded,
    /// Generated because the resource failed to load.
    Fallback,
    /// Generated on purpose (e.g. the untextured floor).
    Generated,
}

/// CPU-side texture: pixels plus mutable sampling settings.
///
/// Pixels never change after creation. Settings are changed in place by
/// `prepare`; `version` increases on each change so a renderer can tell when
/// to rebuild its sampler.
#[derive(Debug)]
pub struct Texture {
    key: String,
    image: RgbaImage,
    source: TextureSource,
    settings: RwLock<TextureSettings>,
    version: AtomicU64,
}

impl Texture {
    pub fn new(key: impl Into<String>, image: RgbaImage, source: TextureSource, settings: TextureSettings) -> Self {
        Self {
            key: key.into(),
            image,
            source,
            settings: RwLock::new(settings),
            version: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[inline]
    pub fn source(&self) -> TextureSource {
        self.source
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.source == TextureSource::Fallback
    }

    pub fn settings(&self) -> TextureSettings {
        self.settings.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Maximum number of mip levels for this texture's size.
    pub fn mip_level_count(&self) -> u32 {
        if !self.settings.read().generate_mipmaps {
            return 1;
        }
        (self.width().max(self.height()).max(1) as f32).log2().floor() as u32 + 1
    }

    /// Descriptor a renderer can create the GPU texture from.
    pub fn descriptor(&self) -> wgpu::TextureDescriptor<'_> {
        wgpu::TextureDescriptor {
            label: Some(self.key.as_str()),
            size: wgpu::Extent3d {
                width: self.width(),
                height: self.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: self.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.settings.read().format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }
    }

    /// Marks the texture for gamma-correct sampling.
    pub fn mark_srgb(&self) {
        let mut settings = self.settings.write();
        if !settings.srgb {
            settings.srgb = true;
            self.version.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn update(&self, f: impl FnOnce(&mut TextureSettings)) {
        let mut settings = self.settings.write();
        let before = settings.clone();
        f(&mut settings);
        if *settings != before {
            self.version.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Configures `handle` to tile across a surface: repeat wrap, `repeat_x` by
/// `repeat_y` periods, rotated about the texture center, trilinear filtering.
/// Color maps are switched to sRGB sampling. Idempotent.
pub fn prepare(
    handle: &TextureHandle,
    repeat_x: f64,
    repeat_y: f64,
    rotation: f64,
    is_color_map: bool,
    max_anisotropy: u16,
) -> TextureHandle {
    let repeat = Vec2::new(repeat_x.max(EPSILON) as f32, repeat_y.max(EPSILON) as f32);
    handle.update(|s| {
        s.address_mode = wgpu::AddressMode::Repeat;
        s.repeat = if repeat.is_finite() { repeat } else { Vec2::ONE };
        s.center = Vec2::splat(0.5);
        s.rotation = rotation as f32;
        s.anisotropy_clamp = max_anisotropy.clamp(1, 16);
        s.min_filter = wgpu::FilterMode::Linear;
        s.mipmap_filter = wgpu::FilterMode::Linear;
        s.mag_filter = wgpu::FilterMode::Linear;
        s.generate_mipmaps = true;
        if is_color_map {
            s.srgb = true;
        }
    });
    Arc::clone(handle)
}

/// Decodes an encoded PNG/JPEG into RGBA8 pixels.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

// ─────────────────────────────────────────────────────────────────────────────
// Procedural texture generators
// ─────────────────────────────────────────────────────────────────────────────

pub struct TextureGenerator;

impl TextureGenerator {
    pub const CHECKER_SIZE: u32 = 256;
    pub const CHECKER_CELLS: u32 = 8;
    pub const CHECKER_DARK: [u8; 4] = [0x2b, 0x2d, 0x30, 0xff];
    pub const CHECKER_LIGHT: [u8; 4] = [0x3a, 0x3c, 0x40, 0xff];

    /// Checkerboard pixels; cell `(0, 0)` uses `color_a`.
    pub fn checkerboard_image(size: u32, cells: u32, color_a: [u8; 4], color_b: [u8; 4]) -> RgbaImage {
        let cell = (size / cells.max(1)).max(1);
        ImageBuffer::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Rgba(color_a)
            } else {
                Rgba(color_b)
            }
        })
    }

    /// The placeholder shown when a texture is missing: 256 px, 8×8 cells,
    /// two dark grays, sRGB, repeat wrap.
    pub fn checkerboard(key: impl Into<String>, source: TextureSource) -> Texture {
        let image = Self::checkerboard_image(
            Self::CHECKER_SIZE,
            Self::CHECKER_CELLS,
            Self::CHECKER_LIGHT,
            Self::CHECKER_DARK,
        );
        Texture::new(key, image, source, TextureSettings::repeating().with_srgb(true))
    }

    pub fn fallback(key: impl Into<String>) -> Texture {
        Self::checkerboard(key, TextureSource::Fallback)
    }
}
