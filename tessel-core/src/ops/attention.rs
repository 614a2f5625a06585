use super::{check_contiguous, check_device, check_same_dtype, check_shape};
use crate::cpu::VecOps;
use crate::{bail, DType, Error, FloatDType, Result, Tensor};

/// Grouped-query causal self-attention over a KV cache.
///
/// Shapes: `q [seq, q_heads, head_dim]`, `k [kv_len, kv_heads, head_dim]`,
/// `v [kv_len, kv_heads, v_dim]`, `attn [seq, q_heads, v_dim]`, with
/// `kv_len >= seq` and `q_heads` a multiple of `kv_heads`. Query position
/// `qp` attends to the `qp + (kv_len - seq) + 1` first cache positions; the
/// causal mask is implicit in never visiting later ones. Scores go through
/// a max-subtracted softmax in f32; if every exponential underflows to zero
/// the weights degenerate to zero.
pub fn self_attention(attn: &Tensor, q: &Tensor, k: &Tensor, v: &Tensor, scale: f32) -> Result<()> {
    let op = "self-attention";
    check_device(op, &[attn, q, k, v])?;
    check_contiguous(op, &[attn, q, k, v])?;
    check_same_dtype(op, &[attn, q, k, v])?;
    let (seq, q_heads, head_dim) = q.dims3()?;
    let (kv_len, kv_heads, k_dim) = k.dims3()?;
    let (v_len, v_heads, v_dim) = v.dims3()?;
    if k_dim != head_dim {
        return Err(Error::ShapeMismatchBinaryOp {
            lhs: q.shape().clone(),
            rhs: k.shape().clone(),
            op,
        }
        .bt());
    }
    if v_len != kv_len || v_heads != kv_heads {
        return Err(Error::ShapeMismatchBinaryOp {
            lhs: k.shape().clone(),
            rhs: v.shape().clone(),
            op,
        }
        .bt());
    }
    check_shape(op, attn, &[seq, q_heads, v_dim])?;
    if kv_heads == 0 || q_heads % kv_heads != 0 {
        bail!("self-attention: {q_heads} query heads cannot be grouped over {kv_heads} kv heads")
    }
    if kv_len < seq {
        bail!("self-attention: kv length {kv_len} is shorter than the query length {seq}")
    }
    match q.dtype() {
        DType::F16 => attention_t::<half::f16>(attn, q, k, v, scale),
        DType::BF16 => attention_t::<half::bf16>(attn, q, k, v, scale),
        DType::F32 => attention_t::<f32>(attn, q, k, v, scale),
        dtype => Err(Error::UnsupportedDTypeForOp(dtype, op).bt()),
    }
}

fn attention_t<T: VecOps>(
    attn: &Tensor,
    q: &Tensor,
    k: &Tensor,
    v: &Tensor,
    scale: f32,
) -> Result<()> {
    let (seq, q_heads, head_dim) = q.dims3()?;
    let (kv_len, kv_heads, _) = k.dims3()?;
    let (_, _, v_dim) = v.dims3()?;
    let group = q_heads / kv_heads;
    let kv_off = kv_len - seq;
    let q_s = q.as_slice::<T>()?;
    let k_s = k.as_slice::<T>()?;
    let v_s = v.as_slice::<T>()?;
    let attn_s = unsafe { attn.as_mut_slice::<T>()? };

    let mut scores = vec![0f32; kv_len];
    let mut acc = vec![0f32; v_dim];
    for q_head in 0..q_heads {
        let kv_head = q_head / group;
        for qp in 0..seq {
            let ctx = (qp + kv_off + 1).min(kv_len);
            let q_row = &q_s[(qp * q_heads + q_head) * head_dim..][..head_dim];
            for (kp, score) in scores[..ctx].iter_mut().enumerate() {
                let k_row = &k_s[(kp * kv_heads + kv_head) * head_dim..][..head_dim];
                *score = scale * T::vec_dot(q_row, k_row)
            }
            softmax(&mut scores[..ctx]);
            acc.fill(0f32);
            for (kp, &w) in scores[..ctx].iter().enumerate() {
                let v_row = &v_s[(kp * kv_heads + kv_head) * v_dim..][..v_dim];
                for (a, value) in acc.iter_mut().zip(v_row.iter()) {
                    *a += w * value.to_f32()
                }
            }
            let out_row = &mut attn_s[(qp * q_heads + q_head) * v_dim..][..v_dim];
            for (o, &a) in out_row.iter_mut().zip(acc.iter()) {
                *o = T::from_f32(a)
            }
        }
    }
    Ok(())
}

/// In-place max-subtracted softmax. A zero exponential sum leaves all
/// weights at zero rather than dividing by it.
fn softmax(scores: &mut [f32]) {
    let max = scores.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let mut sum = 0f32;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        sum += *score
    }
    if sum > 0f32 {
        for score in scores.iter_mut() {
            *score /= sum
        }
    } else {
        scores.fill(0f32)
    }
}
