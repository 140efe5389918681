/*!
# SSAO Engine

Screen-space ambient occlusion renderer built on a backend-agnostic
graphics device.

A frame renders the scene into a G-buffer, evaluates horizon-based (HBAO)
or ground-truth (GTAO) ambient occlusion from it, blurs the result and
composes the lit image into the swapchain. Backends (Vulkan today) provide
the concrete `GraphicsDevice` and `GraphicsContext`.

## Architecture

- **GraphicsDevice**: Factory trait for GPU resources
- **GraphicsContext**: Swapchain, frame fences, submit and present
- **RenderTargetGraph**: G-buffer, occlusion and blur targets
- **OcclusionStrategy**: HBAO / GTAO shader selection and settings
- **FrameOrchestrator**: Per-frame state machine
- **SsaoRenderer**: Ties everything together and handles swapchain recreation
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod graphics_context;
pub mod attachment;
pub mod render_graph;
pub mod occlusion;
pub mod uniforms;
pub mod pipelines;
pub mod frame_resources;
pub mod frame_orchestrator;
pub mod renderer;
pub mod scene;
pub mod shader_loader;
pub mod overlay;
pub mod camera;
pub mod config;

// Main ssao namespace module
pub mod ssao {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Renderer facade and its configuration
    pub use crate::renderer::SsaoRenderer;
    pub use crate::config::Config;
    pub use crate::frame_orchestrator::FrameOutcome;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Backend-facing device traits
    pub mod device {
        pub use crate::graphics_device::*;
        pub use crate::graphics_context::{AcquiredFrame, Fence, GraphicsContext};
        pub use crate::attachment::*;
    }

    // Render targets, passes and frame plumbing
    pub mod render {
        pub use crate::render_graph::*;
        pub use crate::pipelines::*;
        pub use crate::frame_resources::*;
        pub use crate::frame_orchestrator::*;
        pub use crate::uniforms::*;
        pub use crate::shader_loader::*;
    }

    // Occlusion strategies
    pub mod occlusion {
        pub use crate::occlusion::*;
    }

    // Scene, camera and overlay seams
    pub mod scene {
        pub use crate::scene::*;
        pub use crate::camera::*;
        pub use crate::overlay::*;
    }
}

// Re-export math library at crate root
pub use glam;
