/// Sampler trait and sampler descriptor

/// Texel filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Mipmap selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipmapMode {
    Nearest,
    Linear,
}

/// Behaviour outside [0, 1] texture coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Border color used with ClampToBorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderColor {
    FloatTransparentBlack,
    FloatOpaqueBlack,
    FloatOpaqueWhite,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmap_mode: MipmapMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: f32,
    pub min_lod: f32,
    pub max_lod: f32,
    pub border_color: BorderColor,
}

impl SamplerDesc {
    /// The sampler every pass uses to read offscreen attachments:
    /// nearest filtering, clamped to the edge.
    pub fn attachment_reader() -> Self {
        Self {
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            mipmap_mode: MipmapMode::Linear,
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mip_lod_bias: 0.0,
            max_anisotropy: 1.0,
            min_lod: 0.0,
            max_lod: 1.0,
            border_color: BorderColor::FloatOpaqueWhite,
        }
    }
}

/// Sampler resource trait. Immutable once created.
pub trait Sampler: Send + Sync {
    fn desc(&self) -> &SamplerDesc;
}
