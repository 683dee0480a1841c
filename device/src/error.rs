use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Host data length does not match the buffer length on a bulk write.
    #[snafu(display("size mismatch: buffer holds {expected} elements, host data has {actual}"))]
    SizeMismatch { expected: usize, actual: usize },

    /// Indexed assignment with differing index and data lengths.
    #[snafu(display("indices and data length must be the same: {indices} indices, {data} values"))]
    IndexDataMismatch { indices: usize, data: usize },

    /// More elements than space to assign.
    #[snafu(display("more elements than space to assign: buffer length {length}, got {requested}"))]
    AssignOverflow { requested: usize, length: usize },

    /// Offset outside the buffer's logical length.
    #[snafu(display("offset {offset} out of range for buffer of length {length}"))]
    OffsetOutOfRange { offset: usize, length: usize },

    /// Non-contiguous indexed assignment. Hard limitation, not a bug.
    #[snafu(display("only contiguous assignment is supported"))]
    NonContiguous,

    /// Zero-length allocations are rejected by the allocator.
    #[snafu(display("invalid allocation size: {length} elements"))]
    InvalidAllocationSize { length: usize },

    /// A vector transfer would touch device memory past the allocation.
    #[snafu(display(
        "transfer out of bounds: {count} elements at offset {offset} with stride {inc} \
         exceed capacity of {capacity} elements"
    ))]
    TransferOutOfBounds { offset: usize, count: usize, inc: usize, capacity: usize },

    #[cfg(feature = "cuda")]
    /// CUDA runtime errors propagate opaquely.
    #[snafu(display("CUDA error: {source}"))]
    Cuda { source: cudarc::driver::DriverError },
}
