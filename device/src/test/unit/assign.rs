use std::sync::Arc;

use crate::allocator::HostAllocator;
use crate::buffer::FloatBuffer;
use crate::error::Error;

fn filled(length: usize) -> FloatBuffer {
    let mut buf = FloatBuffer::new(Arc::new(HostAllocator), length);
    buf.set_data(&vec![0.0; length]).unwrap();
    buf
}

#[test]
fn contiguous_assign_writes_at_first_index() {
    let mut buf = filled(8);
    buf.assign_indices(&[2, 3, 4], &[1.0, 2.0, 3.0], true, 1).unwrap();
    assert_eq!(buf.as_f32().unwrap(), vec![0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
}

#[test]
fn assign_trusts_only_the_first_index() {
    // Documented contract: the remaining indices are assumed consecutive,
    // never verified. Scattered indices still produce one contiguous
    // write at indices[0].
    let mut buf = filled(8);
    buf.assign_indices(&[1, 5, 7], &[9.0, 8.0, 7.0], true, 1).unwrap();
    assert_eq!(buf.as_f32().unwrap(), vec![0.0, 9.0, 8.0, 7.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn non_contiguous_assign_is_unsupported() {
    let mut buf = filled(8);
    let err = buf.assign_indices(&[0, 1], &[1.0, 2.0], false, 1).unwrap_err();
    assert!(matches!(err, Error::NonContiguous));

    // Rejected regardless of whether the lengths would have been fine.
    let err = buf.assign_indices(&[3], &[1.0], false, 1).unwrap_err();
    assert!(matches!(err, Error::NonContiguous));
}

#[test]
fn mismatched_lengths_fail_before_any_write() {
    let mut buf = filled(4);
    let err = buf.assign_indices(&[0, 1, 2], &[1.0, 2.0], true, 1).unwrap_err();
    assert!(matches!(err, Error::IndexDataMismatch { indices: 3, data: 2 }));
    assert_eq!(buf.as_f32().unwrap(), vec![0.0; 4]);
}

#[test]
fn more_indices_than_capacity_fail() {
    let mut buf = filled(2);
    let err = buf.assign_indices(&[0, 1, 2], &[1.0, 2.0, 3.0], true, 1).unwrap_err();
    assert!(matches!(err, Error::AssignOverflow { requested: 3, length: 2 }));
}

#[test]
fn empty_assignment_is_a_no_op() {
    let mut buf = filled(4);
    buf.assign_indices(&[], &[], true, 1).unwrap();
    assert_eq!(buf.as_f32().unwrap(), vec![0.0; 4]);
}

#[test]
fn strided_assignment_spreads_the_data() {
    let mut buf = filled(6);
    buf.assign_indices(&[0, 2, 4], &[1.0, 2.0, 3.0], true, 2).unwrap();
    assert_eq!(buf.as_f32().unwrap(), vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
}

#[test]
fn assignment_past_capacity_fails_at_the_transfer() {
    let mut buf = filled(4);
    // indices[0] = 3 with three values runs past the allocation; the
    // transfer service is the layer that rejects it.
    let err = buf.assign_indices(&[3, 4, 5], &[1.0, 2.0, 3.0], true, 1).unwrap_err();
    assert!(matches!(err, Error::TransferOutOfBounds { .. }));
}

#[test]
fn double_assignment_narrows_during_staging() {
    let mut buf = filled(4);
    buf.assign_indices_f64(&[1, 2], &[1.0 / 3.0, 2.5], true, 1).unwrap();
    assert_eq!(buf.as_f32().unwrap(), vec![0.0, (1.0f64 / 3.0) as f32, 2.5, 0.0]);
}

#[test]
fn double_assignment_checks_lengths_first() {
    let mut buf = filled(4);
    let err = buf.assign_indices_f64(&[0], &[1.0, 2.0], true, 1).unwrap_err();
    assert!(matches!(err, Error::IndexDataMismatch { indices: 1, data: 2 }));
}
