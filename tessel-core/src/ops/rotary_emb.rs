use super::{check_contiguous, check_device, check_i64, check_same_dtype, check_shape};
use crate::{bail, DType, Error, FloatDType, Result, Tensor};

/// Rotary position embedding over `[seq, heads, head_dim]` tensors, in the
/// split-halves layout: element `i` of a head is paired with element
/// `head_dim / 2 + i`, and each pair is rotated by
/// `pos_ids[s] / theta^(2i / head_dim)`.
pub fn rope(out: &Tensor, inp: &Tensor, pos_ids: &Tensor, theta: f32) -> Result<()> {
    let op = "rope";
    check_device(op, &[out, inp, pos_ids])?;
    check_contiguous(op, &[out, inp, pos_ids])?;
    check_same_dtype(op, &[out, inp])?;
    check_i64("rope expects i64 position ids", pos_ids)?;
    let (seq, heads, head_dim) = inp.dims3()?;
    check_shape(op, out, &[seq, heads, head_dim])?;
    check_shape(op, pos_ids, &[seq])?;
    if head_dim % 2 != 0 {
        bail!("rope: the head dimension {head_dim} has to be even")
    }
    match inp.dtype() {
        DType::F16 => rope_t::<half::f16>(out, inp, pos_ids, theta),
        DType::BF16 => rope_t::<half::bf16>(out, inp, pos_ids, theta),
        DType::F32 => rope_t::<f32>(out, inp, pos_ids, theta),
        dtype => Err(Error::UnsupportedDTypeForOp(dtype, op).bt()),
    }
}

fn rope_t<T: FloatDType>(out: &Tensor, inp: &Tensor, pos_ids: &Tensor, theta: f32) -> Result<()> {
    let (seq, heads, head_dim) = inp.dims3()?;
    let half_dim = head_dim / 2;
    let inp = inp.as_slice::<T>()?;
    let pos_ids = pos_ids.as_slice::<i64>()?;
    let out = unsafe { out.as_mut_slice::<T>()? };

    // One inverse frequency per pair index, expanded into seq x half_dim
    // angle tables.
    let inv_freq: Vec<f32> = (0..half_dim)
        .map(|i| theta.powf(-((2 * i) as f32) / head_dim as f32))
        .collect();
    let mut cos = Vec::with_capacity(seq * half_dim);
    let mut sin = Vec::with_capacity(seq * half_dim);
    for &pos in pos_ids {
        for &inv in inv_freq.iter() {
            let freq = pos as f32 * inv;
            cos.push(freq.cos());
            sin.push(freq.sin())
        }
    }

    for s in 0..seq {
        for head in 0..heads {
            let base = (s * heads + head) * head_dim;
            for i in 0..half_dim {
                let c = cos[s * half_dim + i];
                let sn = sin[s * half_dim + i];
                let x_a = inp[base + i].to_f32();
                let x_b = inp[base + half_dim + i].to_f32();
                out[base + i] = T::from_f32(x_a * c - x_b * sn);
                out[base + half_dim + i] = T::from_f32(x_b * c + x_a * sn);
            }
        }
    }
    Ok(())
}
