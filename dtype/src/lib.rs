//! Element type tags for device-resident numeric buffers.
//!
//! A device buffer stores exactly one element type; the tags here describe
//! the host-side representations it can marshal to and from. All coercion
//! between representations goes through [`cast`] so that narrowing rules
//! live in one place instead of being repeated at every transfer boundary.

pub mod cast;
pub mod ext;

/// Host-side numeric representations a buffer can marshal between.
///
/// The canonical on-device representation is always the buffer's own type;
/// the other tags exist only as host-side views obtained by coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumCount, strum::EnumIter, strum::VariantArray)]
pub enum DType {
    Float32,
    Float64,
    Int32,
}

impl DType {
    /// Size of one element in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            DType::Float32 | DType::Int32 => 4,
            DType::Float64 => 8,
        }
    }
}
