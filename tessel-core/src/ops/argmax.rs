use super::{check_contiguous, check_device, check_i64, check_same_dtype};
use crate::{bail, DType, Error, Result, Tensor, WithDType};

/// Index and value of the largest element.
///
/// The scan runs over all of `vals` in storage order, shape is irrelevant.
/// Ties keep the earliest index. The comparison is a raw `>` so NaN never
/// wins it; a NaN can only surface as the result when it leads the scan.
/// `max_idx` holds a single `i64`, `max_val` a single element of the input
/// dtype.
pub fn argmax(max_idx: &Tensor, max_val: &Tensor, vals: &Tensor) -> Result<()> {
    let op = "argmax";
    check_device(op, &[max_idx, max_val, vals])?;
    check_contiguous(op, &[max_idx, max_val, vals])?;
    check_i64("argmax writes an i64 index", max_idx)?;
    check_same_dtype(op, &[max_val, vals])?;
    if max_idx.elem_count() != 1 || max_val.elem_count() != 1 {
        bail!("argmax: the output tensors have to hold a single element")
    }
    if vals.elem_count() == 0 {
        bail!("argmax: empty input")
    }
    match vals.dtype() {
        DType::F16 => argmax_t::<half::f16>(max_idx, max_val, vals),
        DType::BF16 => argmax_t::<half::bf16>(max_idx, max_val, vals),
        DType::F32 => argmax_t::<f32>(max_idx, max_val, vals),
        DType::I32 => argmax_t::<i32>(max_idx, max_val, vals),
        DType::I64 => argmax_t::<i64>(max_idx, max_val, vals),
        dtype => Err(Error::UnsupportedDTypeForOp(dtype, op).bt()),
    }
}

fn argmax_t<T: WithDType + PartialOrd>(
    max_idx: &Tensor,
    max_val: &Tensor,
    vals: &Tensor,
) -> Result<()> {
    let vals = vals.as_slice::<T>()?;
    let mut best = vals[0];
    let mut best_idx = 0usize;
    for (i, &value) in vals.iter().enumerate().skip(1) {
        if value > best {
            best = value;
            best_idx = i
        }
    }
    unsafe {
        max_idx.as_mut_slice::<i64>()?[0] = best_idx as i64;
        max_val.as_mut_slice::<T>()?[0] = best;
    }
    Ok(())
}
