//! Inference primitives over tensors.
//!
//! All kernels share the same contract: arguments live on the same device,
//! inputs are contiguous, the output tensor is preallocated by the caller
//! with the expected shape and dtype, and nothing is allocated for the
//! caller. Execution is CPU only for now; dispatching an accelerator
//! tensor is an error. Half-precision inputs are promoted to f32 for the
//! arithmetic and narrowed back on write.
mod activation;
mod argmax;
mod attention;
mod embedding;
mod linear;
mod norm;
mod rotary_emb;

pub use activation::swiglu;
pub use argmax::argmax;
pub use attention::self_attention;
pub use embedding::embedding;
pub use linear::linear;
pub use norm::rms_norm;
pub use rotary_emb::rope;

use crate::{DType, Error, Result, Tensor};

/// All arguments on one device, and that device has to be the CPU.
pub(crate) fn check_device(op: &'static str, args: &[&Tensor]) -> Result<()> {
    let device = args[0].device();
    for t in &args[1..] {
        if !t.device().same_device(&device) {
            return Err(Error::DeviceMismatchBinaryOp {
                lhs: device.location(),
                rhs: t.device().location(),
                op,
            }
            .bt());
        }
    }
    if !device.is_cpu() {
        return Err(Error::UnsupportedDeviceForOp(device.location(), op).bt());
    }
    Ok(())
}

pub(crate) fn check_contiguous(op: &'static str, args: &[&Tensor]) -> Result<()> {
    for t in args {
        if !t.is_contiguous() {
            return Err(Error::RequiresContiguous { op }.bt());
        }
    }
    Ok(())
}

pub(crate) fn check_same_dtype(op: &'static str, args: &[&Tensor]) -> Result<()> {
    let dtype = args[0].dtype();
    for t in &args[1..] {
        if t.dtype() != dtype {
            return Err(Error::DTypeMismatchBinaryOp {
                lhs: dtype,
                rhs: t.dtype(),
                op,
            }
            .bt());
        }
    }
    Ok(())
}

pub(crate) fn check_i64(msg: &'static str, t: &Tensor) -> Result<()> {
    if t.dtype() != DType::I64 {
        return Err(Error::UnexpectedDType {
            msg,
            expected: DType::I64,
            got: t.dtype(),
        }
        .bt());
    }
    Ok(())
}

pub(crate) fn check_shape(op: &'static str, t: &Tensor, dims: &[usize]) -> Result<()> {
    if t.dims() != dims {
        return Err(Error::ShapeMismatchBinaryOp {
            lhs: crate::Shape::from(dims),
            rhs: t.shape().clone(),
            op,
        }
        .bt());
    }
    Ok(())
}
