use std::cell::RefCell;

#[cfg(feature = "cuda")]
use std::sync::Arc;

#[cfg(feature = "cuda")]
use cudarc::driver::{CudaContext, CudaSlice};
#[cfg(feature = "cuda")]
use snafu::ResultExt;

use crate::error::{InvalidAllocationSizeSnafu, Result};

#[cfg(feature = "cuda")]
use crate::error::CudaSnafu;

/// Opaque handle to one device allocation.
///
/// Uses `RefCell` for interior mutability with runtime borrow checking.
/// Safe for single-threaded use (buffers are !Send + !Sync).
#[derive(Debug)]
pub enum RawBuffer {
    Host {
        data: RefCell<Box<[u8]>>,
    },
    #[cfg(feature = "cuda")]
    Cuda {
        data: RefCell<CudaSlice<u8>>,
        device: Arc<CudaContext>,
    },
}

impl RawBuffer {
    /// Capacity of the allocation in bytes.
    pub fn size(&self) -> usize {
        match self {
            RawBuffer::Host { data } => data.borrow().len(),
            #[cfg(feature = "cuda")]
            RawBuffer::Cuda { data, .. } => data.borrow().len(),
        }
    }
}

/// The allocation half of the transfer service.
///
/// Allocations are zero-initialized. `free` takes the buffer back by value;
/// the default implementation just drops it, which releases host memory and
/// CUDA slices alike.
pub trait Allocator: Send + Sync + std::fmt::Debug {
    fn alloc(&self, size: usize) -> Result<RawBuffer>;

    fn free(&self, buffer: RawBuffer) {
        drop(buffer);
    }

    /// Wait for outstanding device work. Host memory needs no fence.
    fn synchronize(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Allocator backed by ordinary process memory. Useful on its own and as
/// the reference implementation the tests run against.
#[derive(Debug, Clone)]
pub struct HostAllocator;

impl Allocator for HostAllocator {
    fn alloc(&self, size: usize) -> Result<RawBuffer> {
        snafu::ensure!(size > 0, InvalidAllocationSizeSnafu { length: size });
        let data = vec![0u8; size].into_boxed_slice();
        Ok(RawBuffer::Host { data: RefCell::new(data) })
    }

    fn name(&self) -> &str {
        "HOST"
    }
}

/// Allocator backed by CUDA device memory.
#[cfg(feature = "cuda")]
#[derive(Debug, Clone)]
pub struct CudaAllocator {
    device: Arc<CudaContext>,
    device_id: usize,
}

#[cfg(feature = "cuda")]
impl CudaAllocator {
    pub fn new(device_id: usize) -> Result<Self> {
        let device = CudaContext::new(device_id).context(CudaSnafu)?;
        Ok(Self { device, device_id })
    }

    pub fn device_id(&self) -> usize {
        self.device_id
    }
}

#[cfg(feature = "cuda")]
impl Allocator for CudaAllocator {
    fn alloc(&self, size: usize) -> Result<RawBuffer> {
        snafu::ensure!(size > 0, InvalidAllocationSizeSnafu { length: size });
        let data = self.device.default_stream().alloc_zeros::<u8>(size).context(CudaSnafu)?;
        Ok(RawBuffer::Cuda { data: RefCell::new(data), device: Arc::clone(&self.device) })
    }

    fn synchronize(&self) -> Result<()> {
        self.device.default_stream().synchronize().context(CudaSnafu)
    }

    fn name(&self) -> &str {
        "CUDA"
    }
}
