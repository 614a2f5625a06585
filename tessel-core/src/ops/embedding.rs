use super::{check_contiguous, check_device, check_i64, check_same_dtype, check_shape};
use crate::{Result, Tensor};

/// Embedding table lookup.
///
/// Copies `weight[index[b], :]` into `out[b, :]` for every position of the
/// `i64` index tensor. An out-of-range index, negative ones included,
/// zero-fills the row instead of failing; callers that want bounds errors
/// have to validate beforehand. Rows are moved as raw bytes so every dtype
/// is supported as long as `out` and `weight` agree.
pub fn embedding(out: &Tensor, index: &Tensor, weight: &Tensor) -> Result<()> {
    let op = "embedding";
    check_device(op, &[out, index, weight])?;
    check_contiguous(op, &[out, index, weight])?;
    check_same_dtype(op, &[out, weight])?;
    check_i64("embedding expects i64 indices", index)?;
    let n = index.dims1()?;
    let (rows, dim) = weight.dims2()?;
    check_shape(op, out, &[n, dim])?;

    let index = index.as_slice::<i64>()?;
    let row_bytes = dim * weight.element_size();
    let weight_base = weight.data_ptr() as *const u8;
    let out_base = out.data_ptr();
    for (b, &idx) in index.iter().enumerate() {
        unsafe {
            let dst = out_base.add(b * row_bytes);
            if idx < 0 || idx >= rows as i64 {
                std::ptr::write_bytes(dst, 0, row_bytes)
            } else {
                std::ptr::copy_nonoverlapping(
                    weight_base.add(idx as usize * row_bytes),
                    dst,
                    row_bytes,
                )
            }
        }
    }
    Ok(())
}
