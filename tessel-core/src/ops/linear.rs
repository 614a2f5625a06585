use super::{check_contiguous, check_device, check_same_dtype, check_shape};
use crate::cpu::VecOps;
use crate::{DType, Error, FloatDType, Result, Tensor};
use rayon::prelude::*;

/// Linear projection `out = in . weight^T + bias`.
///
/// `weight` is `[out_features, in_features]` so that the weights of one
/// output unit are contiguous and the inner loop is a plain dot product.
/// When `bias` is `None` the bias term is zero. Half-precision inputs
/// accumulate in f32 and are narrowed once per output element.
pub fn linear(out: &Tensor, inp: &Tensor, weight: &Tensor, bias: Option<&Tensor>) -> Result<()> {
    let op = "linear";
    let mut args = vec![out, inp, weight];
    if let Some(bias) = bias {
        args.push(bias)
    }
    check_device(op, &args)?;
    check_contiguous(op, &args)?;
    check_same_dtype(op, &args)?;
    let (batch, in_f) = inp.dims2()?;
    let (out_f, w_in) = weight.dims2()?;
    if w_in != in_f {
        return Err(Error::ShapeMismatchBinaryOp {
            lhs: inp.shape().clone(),
            rhs: weight.shape().clone(),
            op,
        }
        .bt());
    }
    check_shape(op, out, &[batch, out_f])?;
    if let Some(bias) = bias {
        check_shape(op, bias, &[out_f])?;
    }
    match inp.dtype() {
        DType::F16 => linear_t::<half::f16>(out, inp, weight, bias),
        DType::BF16 => linear_t::<half::bf16>(out, inp, weight, bias),
        DType::F32 => linear_t::<f32>(out, inp, weight, bias),
        dtype => Err(Error::UnsupportedDTypeForOp(dtype, op).bt()),
    }
}

fn linear_t<T: VecOps>(
    out: &Tensor,
    inp: &Tensor,
    weight: &Tensor,
    bias: Option<&Tensor>,
) -> Result<()> {
    let (_batch, in_f) = inp.dims2()?;
    let (out_f, _) = weight.dims2()?;
    if out_f == 0 {
        return Ok(());
    }
    let inp = inp.as_slice::<T>()?;
    let weight = weight.as_slice::<T>()?;
    let bias = match bias {
        Some(bias) => Some(bias.as_slice::<T>()?),
        None => None,
    };
    let out = unsafe { out.as_mut_slice::<T>()? };
    out.par_chunks_mut(out_f).enumerate().for_each(|(row, out_row)| {
        let x = &inp[row * in_f..][..in_f];
        for (o, out_v) in out_row.iter_mut().enumerate() {
            let mut acc = T::vec_dot(x, &weight[o * in_f..][..in_f]);
            if let Some(bias) = bias {
                acc += bias[o].to_f32()
            }
            *out_v = T::from_f32(acc)
        }
    });
    Ok(())
}
