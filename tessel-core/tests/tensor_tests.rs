use std::sync::Arc;
use tessel_core::{DType, Device, Result, Tensor};

#[test]
fn create_contiguous() -> Result<()> {
    let t = Tensor::create((2, 3, 4), DType::F32, Device::Cpu)?;
    assert_eq!(t.dims(), [2, 3, 4]);
    assert_eq!(t.strides(), [12, 4, 1]);
    assert_eq!(t.elem_count(), 24);
    assert_eq!(t.element_size(), 4);
    assert!(t.is_contiguous());
    // Fresh tensors are zeroed.
    assert_eq!(t.view(24)?.to_vec1::<f32>()?, vec![0f32; 24]);
    // Every element fits in the storage buffer.
    assert!(t.elem_count() * t.element_size() <= t.storage().size_in_bytes());
    Ok(())
}

#[test]
fn from_vec_readback() -> Result<()> {
    let t = Tensor::from_vec(vec![1f32, 2., 3., 4., 5., 6.], (2, 3), Device::Cpu)?;
    assert_eq!(t.to_vec2::<f32>()?, [[1., 2., 3.], [4., 5., 6.]]);
    let t = Tensor::from_vec(vec![1i64, 2, 3], 3, Device::Cpu)?;
    assert_eq!(t.dtype(), DType::I64);
    assert_eq!(t.to_vec1::<i64>()?, [1, 2, 3]);
    Ok(())
}

#[test]
fn from_vec_shape_mismatch() -> Result<()> {
    let r = Tensor::from_vec(vec![1f32, 2., 3.], (2, 2), Device::Cpu);
    assert!(r.is_err());
    Ok(())
}

#[test]
fn permute_roundtrip() -> Result<()> {
    let t = Tensor::from_vec(vec![1f32, 2., 3., 4., 5., 6.], (2, 3), Device::Cpu)?;
    let p = t.permute(&[1, 0])?;
    assert_eq!(p.dims(), [3, 2]);
    assert_eq!(p.strides(), [1, 3]);
    assert!(!p.is_contiguous());
    // The view shares the storage.
    assert!(Arc::ptr_eq(t.storage(), p.storage()));
    assert_eq!(
        p.contiguous()?.to_vec2::<f32>()?,
        [[1., 4.], [2., 5.], [3., 6.]]
    );
    // Applying the inverse permutation restores the original metadata.
    let back = p.permute(&[1, 0])?;
    assert_eq!(back.dims(), t.dims());
    assert_eq!(back.strides(), t.strides());
    assert_eq!(back.to_vec2::<f32>()?, t.to_vec2::<f32>()?);
    Ok(())
}

#[test]
fn permute_rejects_non_permutations() -> Result<()> {
    let t = Tensor::create((2, 3), DType::F32, Device::Cpu)?;
    assert!(t.permute(&[0, 0]).is_err());
    assert!(t.permute(&[0]).is_err());
    assert!(t.permute(&[1, 2]).is_err());
    Ok(())
}

#[test]
fn transpose_is_permute() -> Result<()> {
    let t = Tensor::from_vec(vec![1f32, 2., 3., 4., 5., 6.], (2, 3), Device::Cpu)?;
    let tr = t.transpose(0, 1)?;
    assert_eq!(tr.dims(), [3, 2]);
    assert_eq!(tr.strides(), [1, 3]);
    assert!(t.transpose(0, 2).is_err());
    Ok(())
}

#[test]
fn slice_views() -> Result<()> {
    let t = Tensor::from_vec(vec![1f32, 2., 3., 4., 5., 6.], (2, 3), Device::Cpu)?;
    let s = t.slice(1, 1, 3)?;
    assert_eq!(s.dims(), [2, 2]);
    // Strides are unchanged, only the shape and offset move.
    assert_eq!(s.strides(), [3, 1]);
    assert!(!s.is_contiguous());
    assert_eq!(s.contiguous()?.to_vec2::<f32>()?, [[2., 3.], [5., 6.]]);

    let rows = t.slice(0, 1, 2)?;
    assert!(rows.is_contiguous());
    assert_eq!(rows.to_vec2::<f32>()?, [[4., 5., 6.]]);

    // Slicing the full range changes nothing.
    let full = t.slice(0, 0, 2)?;
    assert_eq!(full.dims(), t.dims());
    assert_eq!(full.strides(), t.strides());
    assert_eq!(full.to_vec2::<f32>()?, t.to_vec2::<f32>()?);

    assert!(t.slice(2, 0, 1).is_err());
    assert!(t.slice(1, 2, 1).is_err());
    assert!(t.slice(1, 0, 4).is_err());
    Ok(())
}

#[test]
fn slice_of_permuted() -> Result<()> {
    let t = Tensor::from_vec(vec![1f32, 2., 3., 4., 5., 6.], (2, 3), Device::Cpu)?;
    let p = t.permute(&[1, 0])?;
    let s = p.slice(0, 1, 3)?;
    assert_eq!(s.dims(), [2, 2]);
    assert_eq!(s.strides(), [1, 3]);
    assert_eq!(s.contiguous()?.to_vec2::<f32>()?, [[2., 5.], [3., 6.]]);
    Ok(())
}

#[test]
fn view_reshape() -> Result<()> {
    let t = Tensor::from_vec(vec![1f32, 2., 3., 4., 5., 6.], (2, 3), Device::Cpu)?;
    let v = t.view((3, 2))?;
    assert_eq!(v.elem_count(), t.elem_count());
    assert!(v.is_contiguous());
    assert_eq!(v.to_vec2::<f32>()?, [[1., 2.], [3., 4.], [5., 6.]]);
    let v = t.reshape(6)?;
    assert_eq!(v.to_vec1::<f32>()?, [1., 2., 3., 4., 5., 6.]);
    // Wrong element count.
    assert!(t.view((4, 2)).is_err());
    // Views require contiguity.
    assert!(t.permute(&[1, 0])?.view(6).is_err());
    Ok(())
}

#[test]
fn contiguous_is_idempotent() -> Result<()> {
    let t = Tensor::from_vec(vec![1f32, 2., 3., 4., 5., 6.], (2, 3), Device::Cpu)?;
    // Already contiguous: identity view over the same storage.
    let c = t.contiguous()?;
    assert!(Arc::ptr_eq(t.storage(), c.storage()));
    let p = t.permute(&[1, 0])?;
    let c1 = p.contiguous()?;
    let c2 = c1.contiguous()?;
    assert_eq!(c1.dims(), c2.dims());
    assert_eq!(c1.strides(), c2.strides());
    assert_eq!(c1.to_vec2::<f32>()?, c2.to_vec2::<f32>()?);
    Ok(())
}

#[test]
fn load_raw_bytes() -> Result<()> {
    let t = Tensor::create(3, DType::F32, Device::Cpu)?;
    let bytes: Vec<u8> = [1f32, 2., 3.]
        .iter()
        .flat_map(|v| v.to_ne_bytes())
        .collect();
    t.load(&bytes)?;
    assert_eq!(t.to_vec1::<f32>()?, [1., 2., 3.]);
    // Wrong byte count.
    assert!(t.load(&bytes[..8]).is_err());
    Ok(())
}

#[test]
fn to_device_same_is_identity() -> Result<()> {
    let t = Tensor::from_vec(vec![1f32, 2., 3., 4.], (2, 2), Device::Cpu)?;
    let u = t.to_device(Device::Cpu)?;
    assert!(Arc::ptr_eq(t.storage(), u.storage()));
    assert_eq!(u.contiguous()?.to_vec2::<f32>()?, t.to_vec2::<f32>()?);
    Ok(())
}

#[test]
fn accel_requires_runtime() -> Result<()> {
    // No accelerator runtime is registered in the tests so any device
    // allocation has to fail.
    assert!(Tensor::create((2, 2), DType::F32, Device::Accel(0)).is_err());
    let t = Tensor::create((2, 2), DType::F32, Device::Cpu)?;
    assert!(t.to_device(Device::Accel(0)).is_err());
    Ok(())
}

#[test]
fn slice_then_view() -> Result<()> {
    let t = Tensor::from_vec((0..24).map(|v| v as f32).collect::<Vec<_>>(), (4, 6), Device::Cpu)?;
    let s = t.slice(0, 1, 3)?;
    // A row slice stays contiguous and can be reinterpreted.
    let v = s.view((3, 4))?;
    assert_eq!(
        v.to_vec2::<f32>()?,
        [[6., 7., 8., 9.], [10., 11., 12., 13.], [14., 15., 16., 17.]]
    );
    Ok(())
}

#[test]
fn scalar_tensor() -> Result<()> {
    let t = Tensor::from_vec(vec![42f32], (), Device::Cpu)?;
    assert_eq!(t.rank(), 0);
    assert_eq!(t.elem_count(), 1);
    assert!(t.is_contiguous());
    Ok(())
}
