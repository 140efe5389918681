/// Attachment Manager
///
/// Creates the images that passes render into and later sample. Each
/// attachment is backed by its own dedicated allocation; the attachment set
/// is small and fixed, so pooling buys nothing.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, Texture, TextureDesc, TextureFormat, TextureUsage, AspectMask,
};

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [TextureFormat; 5] = [
    TextureFormat::D32_FLOAT_S8_UINT,
    TextureFormat::D32_FLOAT,
    TextureFormat::D24_UNORM_S8_UINT,
    TextureFormat::D16_UNORM_S8_UINT,
    TextureFormat::D16_UNORM,
];

/// What an attachment is written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Color,
    DepthStencil,
}

impl AttachmentKind {
    /// Device usage for this kind. Sampling is always allowed.
    pub fn usage(&self) -> TextureUsage {
        match self {
            AttachmentKind::Color => TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED,
            AttachmentKind::DepthStencil => TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::SAMPLED,
        }
    }
}

/// Aspect mask implied by a format
///
/// Depth formats from D16_UNORM_S8_UINT upward also carry stencil.
pub fn derive_aspect(format: TextureFormat) -> AspectMask {
    if format.is_depth() {
        if format.has_stencil() {
            AspectMask::DEPTH | AspectMask::STENCIL
        } else {
            AspectMask::DEPTH
        }
    } else {
        AspectMask::COLOR
    }
}

/// First supported depth format of `DEPTH_FORMAT_CANDIDATES`
///
/// Depends only on the device's format support, so repeated calls agree.
pub fn select_depth_format(device: &dyn GraphicsDevice) -> Result<TextureFormat> {
    DEPTH_FORMAT_CANDIDATES
        .iter()
        .copied()
        .find(|format| device.supports_format(*format, TextureUsage::DEPTH_STENCIL_ATTACHMENT))
        .ok_or_else(|| {
            crate::engine_error!("ssao::Attachment", "No supported depth format");
            Error::UnsupportedFormat("no depth/stencil attachment format available".to_string())
        })
}

/// A render-target image with fixed format and aspect
#[derive(Clone)]
pub struct Attachment {
    texture: Arc<dyn Texture>,
    format: TextureFormat,
    kind: AttachmentKind,
    aspect: AspectMask,
}

impl Attachment {
    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    pub fn aspect(&self) -> AspectMask {
        self.aspect
    }

    pub fn width(&self) -> u32 {
        self.texture.info().width
    }

    pub fn height(&self) -> u32 {
        self.texture.info().height
    }

    pub fn label(&self) -> &str {
        &self.texture.info().label
    }
}

/// Create an attachment
///
/// # Errors
///
/// * `UnsupportedFormat` - the device cannot use `format` for `kind`
/// * `ResourceExhausted` - memory allocation failed
pub fn create_attachment(
    device: &dyn GraphicsDevice,
    label: &str,
    format: TextureFormat,
    kind: AttachmentKind,
    width: u32,
    height: u32,
) -> Result<Attachment> {
    let usage = kind.usage();
    let attachment_usage = usage - TextureUsage::SAMPLED;
    if !device.supports_format(format, attachment_usage) {
        crate::engine_error!("ssao::Attachment", "{:?} unsupported as {:?} for '{}'", format, kind, label);
        return Err(Error::UnsupportedFormat(format!("{:?} as {:?}", format, kind)));
    }

    let aspect = derive_aspect(format);
    let texture = device.create_texture(TextureDesc {
        label: label.to_string(),
        width,
        height,
        format,
        usage,
        aspect,
        dedicated: true,
    })?;

    crate::engine_trace!("ssao::Attachment", "Created '{}' {}x{} {:?}", label, width, height, format);

    Ok(Attachment { texture, format, kind, aspect })
}

#[cfg(test)]
#[path = "attachment_tests.rs"]
mod tests;
