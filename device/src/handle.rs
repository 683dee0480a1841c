use std::sync::{Arc, OnceLock};

use floret_dtype::ext::HasDType;
use tracing::{debug, trace};

#[cfg(feature = "cuda")]
use snafu::ResultExt;

use crate::allocator::{Allocator, RawBuffer};
use crate::error::{Result, TransferOutOfBoundsSnafu};

#[cfg(feature = "cuda")]
use crate::error::CudaSnafu;

/// Owns one allocation in device memory, sized `length * element_size`
/// bytes, and mediates every transfer touching it.
///
/// Allocation is lazy: the handle starts unallocated and reserves device
/// memory on the first transfer (lock-free after the first check via
/// `OnceLock`). The allocation is returned to the allocator when the handle
/// is dropped; there is no partial-allocation state.
///
/// Transfers follow cuBLAS vector-copy semantics: `count` elements of
/// `element_size` bytes, unit stride on the host side, stride `inc` on the
/// device side. Every transfer is a blocking call.
#[derive(Debug)]
pub struct DeviceHandle {
    length: usize,
    element_size: usize,
    raw: OnceLock<RawBuffer>,
    allocator: Arc<dyn Allocator>,
}

impl DeviceHandle {
    pub fn new(allocator: Arc<dyn Allocator>, length: usize, element_size: usize) -> Self {
        Self { length, element_size, raw: OnceLock::new(), allocator }
    }

    /// Element count. Immutable after construction.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Bytes per element. Immutable after construction.
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Capacity of the allocation in bytes.
    pub fn size_bytes(&self) -> usize {
        self.length * self.element_size
    }

    pub fn is_allocated(&self) -> bool {
        self.raw.get().is_some()
    }

    pub fn allocator(&self) -> &dyn Allocator {
        &*self.allocator
    }

    /// Clone of the allocator handle, for buffers spawning siblings.
    pub fn shared_allocator(&self) -> Arc<dyn Allocator> {
        Arc::clone(&self.allocator)
    }

    /// Reserve device memory now instead of on first write.
    pub fn allocate(&self) -> Result<()> {
        self.ensure_allocated().map(|_| ())
    }

    /// Native reference to the allocation, if one exists yet.
    pub fn raw(&self) -> Option<&RawBuffer> {
        self.raw.get()
    }

    fn ensure_allocated(&self) -> Result<&RawBuffer> {
        if let Some(raw) = self.raw.get() {
            return Ok(raw);
        }

        let raw = self.allocator.alloc(self.size_bytes())?;
        debug!(
            length = self.length,
            element_size = self.element_size,
            allocator = self.allocator.name(),
            "allocated device buffer"
        );

        // If another allocation raced us through the OnceLock, free ours.
        if let Err(raw) = self.raw.set(raw) {
            self.allocator.free(raw);
        }
        Ok(self.raw.get().expect("just set"))
    }

    /// Check that `count` elements at `offset` with device stride `inc`
    /// stay inside the allocation. The transfer service is the only bounds
    /// enforcement on the scalar and vector access paths; arithmetic that
    /// overflows `usize` is out of bounds by definition, never a panic.
    /// Once the last touched element fits, every byte offset derived from
    /// it fits inside `raw.size()` as well.
    fn check_span(&self, raw: &RawBuffer, offset: usize, count: usize, inc: usize) -> Result<()> {
        let capacity = raw.size() / self.element_size;
        let last = match count {
            0 => Some(offset),
            _ => (count - 1)
                .checked_mul(inc.max(1))
                .and_then(|span| offset.checked_add(span))
                .and_then(|end| end.checked_add(1)),
        };
        snafu::ensure!(
            last.is_some_and(|last| last <= capacity),
            TransferOutOfBoundsSnafu { offset, count, inc, capacity }
        );
        Ok(())
    }

    /// Host-to-device vector transfer: writes `src.len()` elements starting
    /// at element `offset`, device stride `inc`. Allocates on first write.
    pub fn set_vector<T: Copy + HasDType>(&self, offset: usize, inc: usize, src: &[T]) -> Result<()> {
        debug_assert_eq!(T::DTYPE.bytes(), self.element_size);
        let raw = self.ensure_allocated()?;
        self.check_span(raw, offset, src.len(), inc)?;
        trace!(offset, count = src.len(), inc, "host -> device transfer");

        let es = self.element_size;
        let bytes = bytes_of(src);
        match raw {
            RawBuffer::Host { data } => {
                let mut data = data.borrow_mut();
                if inc <= 1 {
                    data[offset * es..(offset + src.len()) * es].copy_from_slice(bytes);
                } else {
                    for i in 0..src.len() {
                        let dst = (offset + i * inc) * es;
                        data[dst..dst + es].copy_from_slice(&bytes[i * es..(i + 1) * es]);
                    }
                }
                Ok(())
            }
            #[cfg(feature = "cuda")]
            RawBuffer::Cuda { data, device } => {
                let mut data = data.borrow_mut();
                let stream = device.default_stream();
                if inc <= 1 {
                    let mut view = data.slice_mut(offset * es..(offset + src.len()) * es);
                    stream.memcpy_htod(bytes, &mut view).context(CudaSnafu)
                } else {
                    for i in 0..src.len() {
                        let dst = (offset + i * inc) * es;
                        let mut view = data.slice_mut(dst..dst + es);
                        stream.memcpy_htod(&bytes[i * es..(i + 1) * es], &mut view).context(CudaSnafu)?;
                    }
                    Ok(())
                }
            }
        }
    }

    /// Device-to-host vector transfer: reads `dst.len()` elements starting
    /// at element `offset`, device stride `inc`. Allocates (zeroed) if the
    /// handle has never been written.
    pub fn get_vector<T: Copy + HasDType>(&self, offset: usize, inc: usize, dst: &mut [T]) -> Result<()> {
        debug_assert_eq!(T::DTYPE.bytes(), self.element_size);
        let raw = self.ensure_allocated()?;
        self.check_span(raw, offset, dst.len(), inc)?;
        trace!(offset, count = dst.len(), inc, "device -> host transfer");

        let es = self.element_size;
        let count = dst.len();
        let bytes = bytes_of_mut(dst);
        match raw {
            RawBuffer::Host { data } => {
                let data = data.borrow();
                if inc <= 1 {
                    bytes.copy_from_slice(&data[offset * es..(offset + count) * es]);
                } else {
                    for i in 0..count {
                        let src = (offset + i * inc) * es;
                        bytes[i * es..(i + 1) * es].copy_from_slice(&data[src..src + es]);
                    }
                }
                Ok(())
            }
            #[cfg(feature = "cuda")]
            RawBuffer::Cuda { data, device } => {
                self.allocator.synchronize()?;
                let data = data.borrow();
                let stream = device.default_stream();
                if inc <= 1 {
                    let view = data.slice(offset * es..(offset + count) * es);
                    stream.memcpy_dtoh(&view, bytes).context(CudaSnafu)
                } else {
                    for i in 0..count {
                        let src = (offset + i * inc) * es;
                        let view = data.slice(src..src + es);
                        stream.memcpy_dtoh(&view, &mut bytes[i * es..(i + 1) * es]).context(CudaSnafu)?;
                    }
                    Ok(())
                }
            }
        }
    }

    /// Deep copy of another handle's content into this one. Both handles
    /// must have the same byte capacity; used by buffer duplication.
    pub fn copy_from(&self, src: &DeviceHandle) -> Result<()> {
        let dst_raw = self.ensure_allocated()?;
        let src_raw = src.ensure_allocated()?;
        self.check_span(dst_raw, 0, src.length, 1)?;
        trace!(bytes = src.size_bytes(), "device -> device copy");

        match (dst_raw, src_raw) {
            (RawBuffer::Host { data: dst }, RawBuffer::Host { data: src }) => {
                dst.borrow_mut().copy_from_slice(&src.borrow());
                Ok(())
            }
            #[cfg(feature = "cuda")]
            (RawBuffer::Cuda { data: dst, device }, RawBuffer::Cuda { data: src, .. }) => {
                let mut dst = dst.borrow_mut();
                let src = src.borrow();
                device
                    .default_stream()
                    .memcpy_dtod(&src.slice(..), &mut dst.slice_mut(..))
                    .context(CudaSnafu)
            }
            // Mixed backends stage through host memory.
            #[cfg(feature = "cuda")]
            (RawBuffer::Host { data: dst }, RawBuffer::Cuda { data: src, device }) => {
                device.default_stream().synchronize().context(CudaSnafu)?;
                let src = src.borrow();
                let mut dst = dst.borrow_mut();
                device.default_stream().memcpy_dtoh(&src.slice(..), &mut dst[..]).context(CudaSnafu)
            }
            #[cfg(feature = "cuda")]
            (RawBuffer::Cuda { data: dst, device }, RawBuffer::Host { data: src }) => {
                let src = src.borrow();
                let mut dst = dst.borrow_mut();
                device.default_stream().memcpy_htod(&src[..], &mut dst.slice_mut(..)).context(CudaSnafu)
            }
        }
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            debug!(bytes = self.size_bytes(), allocator = self.allocator.name(), "released device buffer");
            self.allocator.free(raw);
        }
    }
}

/// View a typed slice as raw bytes for the transfer service.
fn bytes_of<T: Copy>(slice: &[T]) -> &[u8] {
    // Safety: T is Copy/plain-old-data on every call site (f32), and the
    // byte length is exactly the slice's size in memory.
    unsafe { std::slice::from_raw_parts(slice.as_ptr().cast(), std::mem::size_of_val(slice)) }
}

fn bytes_of_mut<T: Copy>(slice: &mut [T]) -> &mut [u8] {
    // Safety: as above; exclusive borrow carries over.
    unsafe { std::slice::from_raw_parts_mut(slice.as_mut_ptr().cast(), std::mem::size_of_val(slice)) }
}
