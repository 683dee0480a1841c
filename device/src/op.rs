//! The element-wise transform abstraction consumed by [`FloatBuffer::apply`].
//!
//! Transforms run entirely on host memory: the buffer stages its content
//! out, hands the scratch slice to the op, and writes the mutated span
//! back. No device-side kernel execution happens here.
//!
//! [`FloatBuffer::apply`]: crate::buffer::FloatBuffer::apply

/// An in-place transform over a host-resident float slice.
pub trait ElementWiseOp {
    fn apply(&self, data: &mut [f32]);
}

/// Closures are transforms.
impl<F: Fn(&mut [f32])> ElementWiseOp for F {
    fn apply(&self, data: &mut [f32]) {
        self(data)
    }
}

/// Multiply every element by a constant.
#[derive(Debug, Clone, Copy)]
pub struct Scale(pub f32);

impl ElementWiseOp for Scale {
    fn apply(&self, data: &mut [f32]) {
        for x in data {
            *x *= self.0;
        }
    }
}

/// Add a constant to every element.
#[derive(Debug, Clone, Copy)]
pub struct AddScalar(pub f32);

impl ElementWiseOp for AddScalar {
    fn apply(&self, data: &mut [f32]) {
        for x in data {
            *x += self.0;
        }
    }
}
