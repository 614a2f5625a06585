use super::{check_contiguous, check_device, check_same_dtype, check_shape};
use crate::{DType, Error, FloatDType, Result, Tensor};
use rayon::prelude::*;

/// RMS normalization over the rows of a `[batch, hidden]` tensor, with the
/// epsilon added inside the square root:
/// `out[b, i] = weight[i] * in[b, i] / sqrt(mean(in[b, :]^2) + eps)`.
///
/// The mean square is accumulated in f32 regardless of the input dtype, so
/// scaling a row by any positive factor leaves the output unchanged up to
/// rounding.
pub fn rms_norm(out: &Tensor, inp: &Tensor, weight: &Tensor, eps: f32) -> Result<()> {
    let op = "rms-norm";
    check_device(op, &[out, inp, weight])?;
    check_contiguous(op, &[out, inp, weight])?;
    check_same_dtype(op, &[out, inp, weight])?;
    let (batch, hidden) = inp.dims2()?;
    check_shape(op, out, &[batch, hidden])?;
    check_shape(op, weight, &[hidden])?;
    match inp.dtype() {
        DType::F16 => rms_norm_t::<half::f16>(out, inp, weight, eps),
        DType::BF16 => rms_norm_t::<half::bf16>(out, inp, weight, eps),
        DType::F32 => rms_norm_t::<f32>(out, inp, weight, eps),
        dtype => Err(Error::UnsupportedDTypeForOp(dtype, op).bt()),
    }
}

fn rms_norm_t<T: FloatDType>(out: &Tensor, inp: &Tensor, weight: &Tensor, eps: f32) -> Result<()> {
    let (_batch, hidden) = inp.dims2()?;
    if hidden == 0 {
        return Ok(());
    }
    let inp = inp.as_slice::<T>()?;
    let weight = weight.as_slice::<T>()?;
    let out = unsafe { out.as_mut_slice::<T>()? };
    out.par_chunks_mut(hidden).enumerate().for_each(|(row, out_row)| {
        let src = &inp[row * hidden..(row + 1) * hidden];
        let mut ms = 0f32;
        for v in src {
            let v = v.to_f32();
            ms += v * v
        }
        let rms = (ms / hidden as f32 + eps).sqrt();
        for (o, (v, w)) in out_row.iter_mut().zip(src.iter().zip(weight.iter())) {
            *o = T::from_f32(w.to_f32() * v.to_f32() / rms)
        }
    });
    Ok(())
}
