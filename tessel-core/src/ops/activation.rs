use super::{check_contiguous, check_device, check_same_dtype, check_shape};
use crate::{DType, Error, FloatDType, Result, Tensor};

/// SwiGLU activation: `out = up * silu(gate)` element-wise, with
/// `silu(x) = x * sigmoid(x) = x / (1 + exp(-x))`.
///
/// Passing the same tensor as both an input and `out` is supported here:
/// every element is read before the matching write.
pub fn swiglu(out: &Tensor, gate: &Tensor, up: &Tensor) -> Result<()> {
    let op = "swiglu";
    check_device(op, &[out, gate, up])?;
    check_contiguous(op, &[out, gate, up])?;
    check_same_dtype(op, &[out, gate, up])?;
    let (rows, cols) = gate.dims2()?;
    check_shape(op, up, &[rows, cols])?;
    check_shape(op, out, &[rows, cols])?;
    match gate.dtype() {
        DType::F16 => swiglu_t::<half::f16>(out, gate, up),
        DType::BF16 => swiglu_t::<half::bf16>(out, gate, up),
        DType::F32 => swiglu_t::<f32>(out, gate, up),
        dtype => Err(Error::UnsupportedDTypeForOp(dtype, op).bt()),
    }
}

fn swiglu_t<T: FloatDType>(out: &Tensor, gate: &Tensor, up: &Tensor) -> Result<()> {
    let n = out.elem_count();
    // Raw pointer walk so that `out` may alias an input.
    let gate = gate.data_ptr() as *const T;
    let up = up.data_ptr() as *const T;
    let out = out.data_ptr() as *mut T;
    for i in 0..n {
        unsafe {
            let g = (*gate.add(i)).to_f32();
            let u = (*up.add(i)).to_f32();
            let silu = g / (1f32 + (-g).exp());
            out.add(i).write(T::from_f32(u * silu))
        }
    }
    Ok(())
}
