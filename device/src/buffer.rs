use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use floret_dtype::{DType, cast};

use crate::allocator::Allocator;
use crate::error::{
    AssignOverflowSnafu, IndexDataMismatchSnafu, NonContiguousSnafu, OffsetOutOfRangeSnafu, Result,
    SizeMismatchSnafu,
};
use crate::handle::DeviceHandle;
use crate::op::ElementWiseOp;

/// A device-resident buffer of `f32` elements.
///
/// The buffer owns exactly one [`DeviceHandle`] and presents a
/// length-bounded, randomly-addressable float vector on top of it. Host
/// data in the double or integer representations is coerced to `f32` at
/// the boundary through [`floret_dtype::cast`]; the narrowing is lossy
/// and not configurable.
///
/// This type is `!Send + !Sync`: one buffer belongs to one thread, and
/// every transfer blocks the calling thread until the transfer service
/// completes it.
pub struct FloatBuffer {
    handle: DeviceHandle,
    /// Marker making the buffer `!Send + !Sync` (single-threaded only).
    _not_send_sync: PhantomData<Rc<()>>,
}

impl std::fmt::Debug for FloatBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatBuffer")
            .field("length", &self.len())
            .field("allocated", &self.handle.is_allocated())
            .finish()
    }
}

impl FloatBuffer {
    /// Create a buffer of `length` elements. Device memory is not reserved
    /// until the first write.
    pub fn new(allocator: Arc<dyn Allocator>, length: usize) -> Self {
        let handle = DeviceHandle::new(allocator, length, DType::Float32.bytes());
        Self { handle, _not_send_sync: PhantomData }
    }

    /// Create a buffer sized and populated from a host slice.
    pub fn from_slice(allocator: Arc<dyn Allocator>, data: &[f32]) -> Result<Self> {
        let mut buffer = Self::new(allocator, data.len());
        buffer.set_data(data)?;
        Ok(buffer)
    }

    /// Logical element count, fixed at construction.
    pub fn len(&self) -> usize {
        self.handle.length()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes per element.
    pub fn element_size(&self) -> usize {
        self.handle.element_size()
    }

    /// The buffer's declared element type.
    pub fn dtype(&self) -> DType {
        DType::Float32
    }

    pub fn is_allocated(&self) -> bool {
        self.handle.is_allocated()
    }

    /// The memory handle backing this buffer.
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    // ----- bulk write -----

    /// Replace the entire buffer content with `data`.
    ///
    /// The host slice must match the buffer length exactly; there is no
    /// partial-copy path. On mismatch the call fails before any device
    /// write, leaving existing content unchanged.
    pub fn set_data(&mut self, data: &[f32]) -> Result<()> {
        snafu::ensure!(
            data.len() == self.len(),
            SizeMismatchSnafu { expected: self.len(), actual: data.len() }
        );
        self.handle.set_vector(0, 1, data)
    }

    /// Coerce doubles to floats (lossy narrowing), then [`Self::set_data`].
    pub fn set_data_f64(&mut self, data: &[f64]) -> Result<()> {
        self.set_data(&cast::narrow_f64(data))
    }

    /// Coerce integers to floats, then [`Self::set_data`].
    pub fn set_data_i32(&mut self, data: &[i32]) -> Result<()> {
        self.set_data(&cast::widen_i32(data))
    }

    // ----- bulk read -----

    /// Read `len` elements starting at `offset`.
    ///
    /// Quirk preserved from the original contract: when `offset + len`
    /// runs past the end of the buffer, the request is silently clipped to
    /// `len - offset` elements instead of failing. When `offset` exceeds
    /// `len` the clip saturates to an empty result.
    pub fn floats_at(&self, offset: usize, mut len: usize) -> Result<Vec<f32>> {
        if offset.checked_add(len).is_none_or(|end| end > self.len()) {
            len = len.saturating_sub(offset);
        }
        let mut out = vec![0.0f32; len];
        self.handle.get_vector(offset, 1, &mut out)?;
        Ok(out)
    }

    /// [`Self::floats_at`] widened to doubles.
    pub fn doubles_at(&self, offset: usize, len: usize) -> Result<Vec<f64>> {
        Ok(cast::widen_f32(&self.floats_at(offset, len)?))
    }

    /// Export the entire buffer as floats via one full-length transfer.
    pub fn as_f32(&self) -> Result<Vec<f32>> {
        let mut out = vec![0.0f32; self.len()];
        self.handle.get_vector(0, 1, &mut out)?;
        Ok(out)
    }

    /// Export as doubles (exact widening).
    pub fn as_f64(&self) -> Result<Vec<f64>> {
        Ok(cast::widen_f32(&self.as_f32()?))
    }

    /// Export as integers, truncating toward zero.
    pub fn as_i32(&self) -> Result<Vec<i32>> {
        Ok(cast::truncate_f32(&self.as_f32()?))
    }

    /// Byte serialization is not implemented for the float variant; the
    /// result is always empty. This is a documented stub, not an error.
    pub fn as_bytes(&self) -> Vec<u8> {
        Vec::new()
    }

    // ----- scalar access -----

    /// Read one element. Bounds are enforced only by the transfer service.
    pub fn get_f32(&self, index: usize) -> Result<f32> {
        let mut out = [0.0f32];
        self.handle.get_vector(index, 1, &mut out)?;
        Ok(out[0])
    }

    pub fn get_f64(&self, index: usize) -> Result<f64> {
        Ok(f64::from(self.get_f32(index)?))
    }

    /// Read one element truncated toward zero.
    pub fn get_i32(&self, index: usize) -> Result<i32> {
        Ok(cast::truncate(self.get_f32(index)?))
    }

    /// Write one element via a single-element staged transfer.
    pub fn put_f32(&mut self, index: usize, value: f32) -> Result<()> {
        self.handle.set_vector(index, 1, &[value])
    }

    pub fn put_f64(&mut self, index: usize, value: f64) -> Result<()> {
        self.put_f32(index, cast::narrow(value))
    }

    pub fn put_i32(&mut self, index: usize, value: i32) -> Result<()> {
        self.put_f32(index, cast::widen_int(value))
    }

    // ----- range fill and indexed assignment -----

    /// Fill every element from `offset` to the end with `value`, staged as
    /// one host array and written in a single vector transfer.
    pub fn assign_scalar(&mut self, value: f32, offset: usize) -> Result<()> {
        snafu::ensure!(offset <= self.len(), OffsetOutOfRangeSnafu { offset, length: self.len() });
        let staged = vec![value; self.len() - offset];
        self.handle.set_vector(offset, 1, &staged)
    }

    /// Write `data` to consecutive positions described by `indices`.
    ///
    /// Only `contiguous = true` is supported; `false` is a hard documented
    /// limitation. The write offset is taken from `indices[0]` and the
    /// remaining indices are trusted, not verified, to be consecutive —
    /// preserved from the original contract (see the crate design notes).
    /// `inc` is the device-side stride of the write.
    pub fn assign_indices(
        &mut self,
        indices: &[usize],
        data: &[f32],
        contiguous: bool,
        inc: usize,
    ) -> Result<()> {
        snafu::ensure!(
            indices.len() == data.len(),
            IndexDataMismatchSnafu { indices: indices.len(), data: data.len() }
        );
        snafu::ensure!(
            indices.len() <= self.len(),
            AssignOverflowSnafu { requested: indices.len(), length: self.len() }
        );
        snafu::ensure!(contiguous, NonContiguousSnafu);

        let Some(&offset) = indices.first() else {
            return Ok(());
        };
        self.handle.set_vector(offset, inc, data)
    }

    /// [`Self::assign_indices`] with double data, coerced during staging.
    pub fn assign_indices_f64(
        &mut self,
        indices: &[usize],
        data: &[f64],
        contiguous: bool,
        inc: usize,
    ) -> Result<()> {
        snafu::ensure!(
            indices.len() == data.len(),
            IndexDataMismatchSnafu { indices: indices.len(), data: data.len() }
        );
        self.assign_indices(indices, &cast::narrow_f64(data), contiguous, inc)
    }

    // ----- duplication -----

    /// Deep copy: a new buffer of the same length with its own allocation
    /// and identical content. No state is shared with the original.
    pub fn dup(&self) -> Result<Self> {
        let dup = Self::new(self.handle.shared_allocator(), self.len());
        dup.handle.copy_from(&self.handle)?;
        Ok(dup)
    }

    // ----- transform application -----

    /// Apply an element-wise transform to `[offset, len)` by staging
    /// through host memory.
    ///
    /// Three-phase protocol: (1) materialize the span into a host scratch
    /// array, (2) run the transform in place on the scratch, (3) write the
    /// span back to device memory at `offset`. Both the read and the
    /// write-back cover exactly `len() - offset` elements; the original
    /// contract read the full buffer length into the span-sized scratch,
    /// an overrun this implementation deliberately does not reproduce.
    pub fn apply(&mut self, op: &dyn ElementWiseOp, offset: usize) -> Result<()> {
        snafu::ensure!(offset < self.len(), OffsetOutOfRangeSnafu { offset, length: self.len() });
        let span = self.len() - offset;

        let mut scratch = vec![0.0f32; span];
        self.handle.get_vector(offset, 1, &mut scratch)?;
        op.apply(&mut scratch);
        self.handle.set_vector(offset, 1, &scratch)
    }
}
