//! wgpu device and window surface.
//!
//! [`Gpu`] owns the device, queue and the configured surface of one window.
//! Frames are acquired with [`Gpu::begin_frame`] and presented with
//! [`Gpu::submit`].

mod frame;
mod gpu;
mod init;

pub use frame::{GpuFrame, SurfaceErrorAction};
pub use gpu::Gpu;
pub use init::GpuInit;
