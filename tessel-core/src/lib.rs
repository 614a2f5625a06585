//! Strided tensors and the CPU primitives of transformer inference.
//!
//! A [`Tensor`] is a view over a reference-counted byte [`Storage`]: shape,
//! signed element strides and a byte offset. Views (`permute`, `slice`,
//! `view`) share their source storage; `contiguous` and `to_device` copy.
//! The kernels in [`ops`] consume contiguous tensors and write into
//! caller-allocated outputs, promoting `f16`/`bf16` arithmetic to `f32`.
//!
//! ```rust
//! use tessel_core::{ops, DType, Device, Tensor};
//!
//! let vals = Tensor::from_vec(vec![3f32, 1., 4., 1., 5.], 5, Device::Cpu)?;
//! let idx = Tensor::zeros(1, DType::I64, Device::Cpu)?;
//! let max = Tensor::zeros(1, DType::F32, Device::Cpu)?;
//! ops::argmax(&idx, &max, &vals)?;
//! assert_eq!(idx.to_vec1::<i64>()?, [4]);
//! assert_eq!(max.to_vec1::<f32>()?, [5.]);
//! # Ok::<(), tessel_core::Error>(())
//! ```
pub mod cpu;
mod device;
mod display;
mod dtype;
mod error;
mod layout;
pub mod ops;
mod runtime;
mod shape;
mod storage;
mod tensor;

pub use device::{Device, DeviceLocation};
pub use dtype::{cast, DType, FloatDType, WithDType};
pub use error::{Error, Result};
pub use layout::{Layout, StridedIndex};
pub use runtime::{register_runtime, DeviceRuntime, HostRuntime, MemcpyKind};
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;
