use crate::FloatDType;

/// Inner vector kernels shared by the matrix and attention ops.
///
/// Everything accumulates at f32 precision: half-precision inputs are
/// promoted element by element and the result is narrowed by the caller.
pub trait VecOps: FloatDType {
    /// Dot-product of two equally sized vectors, accumulated in f32.
    #[inline(always)]
    fn vec_dot(lhs: &[Self], rhs: &[Self]) -> f32 {
        let mut acc = 0f32;
        for (l, r) in lhs.iter().zip(rhs.iter()) {
            acc += l.to_f32() * r.to_f32()
        }
        acc
    }
}

impl VecOps for f32 {
    #[inline(always)]
    fn vec_dot(lhs: &[Self], rhs: &[Self]) -> f32 {
        // Four independent accumulators so the adds can pipeline.
        let mut acc = [0f32; 4];
        let chunks = lhs.len() / 4 * 4;
        let (lhs_c, lhs_r) = lhs.split_at(chunks);
        let (rhs_c, rhs_r) = rhs.split_at(chunks);
        for (l, r) in lhs_c.chunks_exact(4).zip(rhs_c.chunks_exact(4)) {
            acc[0] += l[0] * r[0];
            acc[1] += l[1] * r[1];
            acc[2] += l[2] * r[2];
            acc[3] += l[3] * r[3];
        }
        let mut sum = (acc[0] + acc[1]) + (acc[2] + acc[3]);
        for (l, r) in lhs_r.iter().zip(rhs_r.iter()) {
            sum += l * r
        }
        sum
    }
}

impl VecOps for half::f16 {}
impl VecOps for half::bf16 {}
