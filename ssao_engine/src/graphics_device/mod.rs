/// Graphics device module - GPU resource traits and descriptors

pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod shader;
pub mod sampler;
pub mod pipeline;
pub mod command_list;
pub mod render_pass;
pub mod binding_group;
pub mod frame_buffer;

pub use graphics_device::*;
pub use texture::*;
pub use buffer::*;
pub use shader::*;
pub use sampler::*;
pub use pipeline::*;
pub use command_list::*;
pub use render_pass::*;
pub use binding_group::*;
pub use frame_buffer::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
