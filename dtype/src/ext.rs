use super::*;

/// Maps a host numeric type to its [`DType`] tag.
pub trait HasDType {
    const DTYPE: DType;
}

macro_rules! impl_dtype_ext {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(impl HasDType for $ty { const DTYPE: DType = $dtype; })*
    };
}

impl_dtype_ext! {
    f32 => DType::Float32,
    f64 => DType::Float64,
    i32 => DType::Int32,
}
