//! Typed, device-resident float buffers with explicit host↔device
//! marshalling.
//!
//! The crate is the storage substrate for numeric array layers above it:
//! a [`FloatBuffer`] owns one contiguous allocation of accelerator memory
//! through a [`DeviceHandle`] and mediates every transfer touching it.
//! Host data in the double or integer representations is coerced to the
//! canonical `f32` representation at the boundary (see `floret-dtype`).
//!
//! # Module Organization
//!
//! - [`allocator`] - The transfer service's allocation half: [`RawBuffer`],
//!   the [`Allocator`] trait, host and CUDA backends
//! - [`handle`] - [`DeviceHandle`], one lazily-allocated device region with
//!   strided vector transfer primitives
//! - [`buffer`] - [`FloatBuffer`], the typed buffer and its operation set
//! - [`op`] - the host-side element-wise transform abstraction
//! - [`error`] - error types and result handling
//!
//! GPU support is gated behind the `cuda` feature; the default build is
//! host-only and exercises the same transfer protocol against process
//! memory.

pub mod allocator;
pub mod buffer;
pub mod error;
pub mod handle;
pub mod op;


pub use allocator::{Allocator, HostAllocator, RawBuffer};
pub use buffer::FloatBuffer;
pub use error::{Error, Result};
pub use handle::DeviceHandle;
pub use op::ElementWiseOp;

#[cfg(feature = "cuda")]
pub use allocator::CudaAllocator;
