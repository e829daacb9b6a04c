/// Texture trait, texture descriptor, usage flags and sampler description

use std::any::Any;
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::Result;

/// Maximum number of simultaneously bound render textures
pub const MAX_RENDER_TARGETS: usize = 8;

/// Pixel format of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PixelFormat {
    R8G8B8A8_UNORM,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::R8G8B8A8_UNORM => 4,
        }
    }
}

bitflags! {
    /// How a texture may be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Sampled from shaders
        const SHADER = 1;
        /// Bound as a color target with `set_render_textures`
        const RENDER_TEXTURE = 2;
        /// Full mip chain generated from level 0 after upload
        const GENERATE_MIPMAPS = 1 << 16;
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub usage: TextureUsage,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32, usage: TextureUsage) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::R8G8B8A8_UNORM,
            usage,
        }
    }

    /// Byte size of mip level 0
    pub fn data_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize
    }

    /// Number of mip levels the texture is created with
    pub fn mip_levels(&self) -> u32 {
        if self.usage.contains(TextureUsage::GENERATE_MIPMAPS) {
            32 - self.width.max(self.height).max(1).leading_zeros()
        } else {
            1
        }
    }

    /// True when the texture is only ever a color attachment
    pub fn is_render_only(&self) -> bool {
        self.usage.contains(TextureUsage::RENDER_TEXTURE) && !self.usage.contains(TextureUsage::SHADER)
    }

    /// Check the descriptor and the optional initial data
    pub fn validate(&self, data: Option<&[u8]>) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(crate::sprout_invariant!(
                "sprout::texture",
                "Texture size {}x{} must be non-zero",
                self.width,
                self.height
            ));
        }

        if self.usage.is_empty() {
            return Err(crate::sprout_invariant!(
                "sprout::texture",
                "Texture usage must not be empty"
            ));
        }

        if self.usage.contains(TextureUsage::RENDER_TEXTURE | TextureUsage::GENERATE_MIPMAPS)
            && !self.usage.contains(TextureUsage::SHADER)
        {
            return Err(crate::sprout_invariant!(
                "sprout::texture",
                "A render-only texture cannot generate mipmaps (usage {:?})",
                self.usage
            ));
        }

        if let Some(bytes) = data {
            if bytes.len() != self.data_size() {
                return Err(crate::sprout_invariant!(
                    "sprout::texture",
                    "Texture data is {} bytes, expected {} for {}x{} RGBA8",
                    bytes.len(),
                    self.data_size(),
                    self.width,
                    self.height
                ));
            }
        }

        Ok(())
    }
}

// ===== SAMPLER =====

/// Texel filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Linear,
    Point,
}

/// Behaviour outside the [0, 1] texture coordinate range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureAddress {
    Repeat,
    RepeatMirrored,
    ClampToEdge,
    ClampToBorder,
}

/// Sampler description
///
/// Plain value; backends realize it into a native object through a cache
/// keyed by the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sampler {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mip_filter: Filter,
    pub address_u: TextureAddress,
    pub address_v: TextureAddress,
}

impl Sampler {
    pub const LINEAR: Sampler = Sampler::uniform(Filter::Linear, TextureAddress::Repeat);
    pub const POINT: Sampler = Sampler::uniform(Filter::Point, TextureAddress::Repeat);
    pub const LINEAR_CLAMP: Sampler = Sampler::uniform(Filter::Linear, TextureAddress::ClampToEdge);
    pub const POINT_CLAMP: Sampler = Sampler::uniform(Filter::Point, TextureAddress::ClampToEdge);

    const fn uniform(filter: Filter, address: TextureAddress) -> Sampler {
        Sampler {
            min_filter: filter,
            mag_filter: filter,
            mip_filter: filter,
            address_u: address,
            address_v: address,
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Sampler::LINEAR
    }
}

// ===== TEXTURE TRAIT =====

/// GPU texture
///
/// The sampler is mutable after creation; the native sampler object is
/// resolved lazily by the backend.
pub trait Texture: Any {
    fn desc(&self) -> &TextureDesc;

    fn width(&self) -> u32 {
        self.desc().width
    }

    fn height(&self) -> u32 {
        self.desc().height
    }

    fn usage(&self) -> TextureUsage {
        self.desc().usage
    }

    fn sampler(&self) -> Sampler;

    fn set_sampler(&self, sampler: Sampler) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Identity comparison of two texture handles
pub fn same_texture(a: &Arc<dyn Texture>, b: &Arc<dyn Texture>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Check a render target list and return its common size
///
/// An empty list is valid and means "the swapchain"; it returns `None`.
pub fn validate_render_targets(textures: &[Arc<dyn Texture>]) -> Result<Option<(u32, u32)>> {
    let Some(first) = textures.first() else {
        return Ok(None);
    };

    if textures.len() > MAX_RENDER_TARGETS {
        return Err(crate::sprout_invariant!(
            "sprout::texture",
            "{} render textures bound, at most {} are supported",
            textures.len(),
            MAX_RENDER_TARGETS
        ));
    }

    let size = (first.width(), first.height());
    for (i, texture) in textures.iter().enumerate() {
        if !texture.usage().contains(TextureUsage::RENDER_TEXTURE) {
            return Err(crate::sprout_invariant!(
                "sprout::texture",
                "Render texture {} lacks RENDER_TEXTURE usage",
                i
            ));
        }
        if (texture.width(), texture.height()) != size {
            return Err(crate::sprout_invariant!(
                "sprout::texture",
                "Render texture {} is {}x{}, expected {}x{}",
                i,
                texture.width(),
                texture.height(),
                size.0,
                size.1
            ));
        }
        if textures[..i].iter().any(|other| same_texture(other, texture)) {
            return Err(crate::sprout_invariant!(
                "sprout::texture",
                "Render texture {} is bound twice",
                i
            ));
        }
    }

    Ok(Some(size))
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
