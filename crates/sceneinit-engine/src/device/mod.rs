//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue for a window
//! - configuring the swapchain and the size-dependent attachments
//! - acquiring frames and clearing them for the scene

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::GpuSurface;
pub use init::GpuInit;
