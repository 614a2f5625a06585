//! Tensors are N-dimensional matrixes of elements using a single data type.
use crate::layout::Layout;
use crate::runtime::{self, MemcpyKind};
use crate::shape::Shape;
use crate::storage::Storage;
use crate::{bail, DType, Device, Error, Result, WithDType};
use std::sync::Arc;

/// A strided view over a reference-counted storage buffer.
///
/// Tensors are cheap to clone: the storage is shared and the metadata
/// (dtype, shape, strides, byte offset) is copied. Operations such as
/// [`Tensor::permute`] or [`Tensor::slice`] return views aliasing the same
/// storage; [`Tensor::contiguous`] and [`Tensor::to_device`] materialize a
/// fresh buffer. Metadata is immutable after construction.
#[derive(Clone)]
pub struct Tensor {
    storage: Arc<Storage>,
    layout: Layout,
    dtype: DType,
}

impl Tensor {
    /// Single construction chokepoint for views: checks that every element
    /// reachable through `layout` stays inside the storage buffer.
    fn from_parts(storage: Arc<Storage>, layout: Layout, dtype: DType) -> Result<Self> {
        let elem_size = dtype.size_in_bytes() as isize;
        let (lo, hi) = layout.elem_span();
        let start = layout.start_offset() as isize;
        let byte_lo = start + lo * elem_size;
        let byte_hi = start + hi * elem_size;
        if byte_lo < 0 || byte_hi as usize > storage.size_in_bytes() {
            return Err(Error::InternalError("tensor layout escapes its storage").bt());
        }
        Ok(Self {
            storage,
            layout,
            dtype,
        })
    }

    /// Allocates a fresh zeroed contiguous row-major tensor on the given
    /// device.
    ///
    /// CPU requests go through the runtime's host allocator so that a
    /// registered accelerator runtime can hand out pinned memory.
    pub fn create<S: Into<Shape>>(shape: S, dtype: DType, device: Device) -> Result<Self> {
        let shape = shape.into();
        let storage = Storage::new(shape.elem_count() * dtype.size_in_bytes(), device)?;
        Self::from_parts(storage, Layout::contiguous(shape), dtype)
    }

    /// Alias of [`Tensor::create`]: freshly allocated tensors are zeroed.
    pub fn zeros<S: Into<Shape>>(shape: S, dtype: DType, device: Device) -> Result<Self> {
        Self::create(shape, dtype, device)
    }

    /// Creates a new tensor initialized with values from the input vector.
    pub fn from_vec<T: WithDType, S: Into<Shape>>(
        data: Vec<T>,
        shape: S,
        device: Device,
    ) -> Result<Self> {
        Self::from_slice(&data, shape, device)
    }

    /// Creates a new tensor initialized with values copied from the input
    /// slice.
    pub fn from_slice<T: WithDType, S: Into<Shape>>(
        data: &[T],
        shape: S,
        device: Device,
    ) -> Result<Self> {
        let shape = shape.into();
        if shape.elem_count() != data.len() {
            return Err(Error::UnexpectedShape {
                msg: format!("slice of {} elements does not fill the shape", data.len()),
                expected: Shape::from(data.len()),
                got: shape,
            }
            .bt());
        }
        let tensor = Self::create(shape, T::DTYPE, device)?;
        let bytes = unsafe {
            std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data))
        };
        tensor.load(bytes)?;
        Ok(tensor)
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> Device {
        self.storage.device()
    }

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape().dims()
    }

    pub fn dims1(&self) -> Result<usize> {
        self.shape().dims1()
    }

    pub fn dims2(&self) -> Result<(usize, usize)> {
        self.shape().dims2()
    }

    pub fn dims3(&self) -> Result<(usize, usize, usize)> {
        self.shape().dims3()
    }

    /// Strides in number of elements, not bytes.
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    pub fn rank(&self) -> usize {
        self.shape().rank()
    }

    pub fn elem_count(&self) -> usize {
        self.shape().elem_count()
    }

    pub fn element_size(&self) -> usize {
        self.dtype.size_in_bytes()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Raw pointer to the first element of this view. This is the single
    /// place where the byte offset meets the storage pointer; all further
    /// addressing multiplies element strides by the element size.
    pub fn data_ptr(&self) -> *mut u8 {
        self.storage.memory().wrapping_add(self.layout.start_offset())
    }

    /// Returns a view with its dimensions reordered, sharing the storage.
    /// `idxs` must be a permutation of `0..rank`. The result is
    /// non-contiguous for any non-trivial permutation.
    pub fn permute(&self, idxs: &[usize]) -> Result<Self> {
        let layout = self.layout.permute(idxs)?;
        Self::from_parts(self.storage.clone(), layout, self.dtype)
    }

    /// Swaps two dimensions, as a view.
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Self> {
        let rank = self.rank();
        if dim0 >= rank || dim1 >= rank {
            let dim = dim0.max(dim1);
            return Err(Error::DimOutOfRange {
                shape: self.shape().clone(),
                dim,
                op: "transpose",
            }
            .bt());
        }
        let mut idxs: Vec<_> = (0..rank).collect();
        idxs.swap(dim0, dim1);
        self.permute(&idxs)
    }

    /// Reinterprets a contiguous tensor under a new shape with the same
    /// number of elements, as a view with fresh row-major strides.
    pub fn view<S: Into<Shape>>(&self, shape: S) -> Result<Self> {
        let shape = shape.into();
        if !self.is_contiguous() {
            return Err(Error::RequiresContiguous { op: "view" }.bt());
        }
        if shape.elem_count() != self.elem_count() {
            return Err(Error::UnexpectedShape {
                msg: "view: element counts differ".to_string(),
                expected: self.shape().clone(),
                got: shape,
            }
            .bt());
        }
        let layout = Layout::contiguous_with_offset(shape, self.layout.start_offset());
        Self::from_parts(self.storage.clone(), layout, self.dtype)
    }

    /// Alias of [`Tensor::view`].
    pub fn reshape<S: Into<Shape>>(&self, shape: S) -> Result<Self> {
        self.view(shape)
    }

    /// Restricts dimension `dim` to `start..end`, as a view. Strides are
    /// unchanged so any non-contiguity along other dimensions is preserved.
    pub fn slice(&self, dim: usize, start: usize, end: usize) -> Result<Self> {
        let layout = self
            .layout
            .slice(dim, start, end, self.element_size(), "slice")?;
        Self::from_parts(self.storage.clone(), layout, self.dtype)
    }

    /// Returns a tensor with the same data laid out contiguously. Already
    /// contiguous tensors are returned as views sharing the storage;
    /// otherwise the elements are gather-copied into a fresh buffer.
    ///
    /// Only defined on the CPU: accelerator tensors have to be moved to the
    /// host first.
    pub fn contiguous(&self) -> Result<Self> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        if !self.device().is_cpu() {
            return Err(
                Error::UnsupportedDeviceForOp(self.device().location(), "contiguous").bt(),
            );
        }
        let dst = Self::create(self.shape(), self.dtype, Device::Cpu)?;
        let elem_size = self.element_size();
        let src_base = self.data_ptr() as *const u8;
        let dst_base = dst.data_ptr();
        for (dst_i, src_offset) in self.layout.strided_index().enumerate() {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    src_base.offset(src_offset * elem_size as isize),
                    dst_base.add(dst_i * elem_size),
                    elem_size,
                )
            }
        }
        Ok(dst)
    }

    /// Copies `elem_count * element_size` raw host bytes into this tensor's
    /// storage at its byte offset.
    pub fn load(&self, data: &[u8]) -> Result<()> {
        if !self.is_contiguous() {
            return Err(Error::RequiresContiguous { op: "load" }.bt());
        }
        let size = self.elem_count() * self.element_size();
        if data.len() != size {
            bail!("load: got {} bytes for a {size} byte tensor", data.len())
        }
        let rt = runtime::runtime();
        let kind = match self.device() {
            Device::Cpu => MemcpyKind::HostToHost,
            Device::Accel(ordinal) => {
                rt.set_device(ordinal)?;
                MemcpyKind::HostToDevice
            }
        };
        unsafe { rt.memcpy_sync(self.data_ptr(), data.as_ptr(), size, kind) }
    }

    /// Moves the tensor to another device, copying the data. Returns a view
    /// of `self` when the tensor is already there.
    ///
    /// A non-contiguous CPU source is gathered first; a non-contiguous
    /// accelerator source is an error as the gather only runs on the host.
    pub fn to_device(&self, device: Device) -> Result<Self> {
        if self.device().same_device(&device) {
            return Ok(self.clone());
        }
        let src = if self.is_contiguous() {
            self.clone()
        } else if self.device().is_cpu() {
            self.contiguous()?
        } else {
            return Err(Error::RequiresContiguous { op: "to-device" }.bt());
        };
        let dst = Self::create(self.shape(), self.dtype, device)?;
        let rt = runtime::runtime();
        let kind = match (src.device(), device) {
            (Device::Cpu, Device::Cpu) => MemcpyKind::HostToHost,
            (Device::Cpu, Device::Accel(ordinal)) => {
                rt.set_device(ordinal)?;
                MemcpyKind::HostToDevice
            }
            (Device::Accel(ordinal), Device::Cpu) => {
                rt.set_device(ordinal)?;
                MemcpyKind::DeviceToHost
            }
            (Device::Accel(_), Device::Accel(ordinal)) => {
                rt.set_device(ordinal)?;
                MemcpyKind::DeviceToDevice
            }
        };
        let size = src.elem_count() * src.element_size();
        tracing::debug!(
            size,
            from = %src.device().location(),
            to = %device.location(),
            "tensor transfer"
        );
        unsafe { rt.memcpy_sync(dst.data_ptr(), src.data_ptr() as *const u8, size, kind)? };
        Ok(dst)
    }

    /// Synchronizes the device, then prints the tensor metadata and every
    /// element in shape order. Accelerator tensors are materialized on the
    /// host for printing.
    pub fn debug(&self) -> Result<()> {
        self.device().synchronize()?;
        if self.device().is_cpu() {
            println!("{self}");
        } else {
            println!("{}", self.to_device(Device::Cpu)?);
        }
        Ok(())
    }

    /// Typed read-only access to a contiguous CPU tensor.
    pub(crate) fn as_slice<T: WithDType>(&self) -> Result<&[T]> {
        if T::DTYPE != self.dtype {
            return Err(Error::UnexpectedDType {
                msg: "unexpected dtype for typed access",
                expected: T::DTYPE,
                got: self.dtype,
            }
            .bt());
        }
        if !self.device().is_cpu() {
            return Err(Error::UnsupportedDeviceForOp(self.device().location(), "as-slice").bt());
        }
        if !self.is_contiguous() {
            return Err(Error::RequiresContiguous { op: "as-slice" }.bt());
        }
        let ptr = self.data_ptr() as *const T;
        Ok(unsafe { std::slice::from_raw_parts(ptr, self.elem_count()) })
    }

    /// Typed write access to a contiguous CPU tensor.
    ///
    /// # Safety
    ///
    /// The caller must guarantee exclusive access to the elements of this
    /// view for the lifetime of the returned slice; aliasing views of the
    /// same storage must not be read or written through in the meantime.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn as_mut_slice<T: WithDType>(&self) -> Result<&mut [T]> {
        self.as_slice::<T>()?;
        let ptr = self.data_ptr() as *mut T;
        Ok(std::slice::from_raw_parts_mut(ptr, self.elem_count()))
    }

    /// The values of a rank 1 tensor, as a vector.
    pub fn to_vec1<T: WithDType>(&self) -> Result<Vec<T>> {
        self.dims1()?;
        Ok(self.as_slice::<T>()?.to_vec())
    }

    /// The values of a rank 2 tensor, as vectors of rows.
    pub fn to_vec2<T: WithDType>(&self) -> Result<Vec<Vec<T>>> {
        let (_rows, cols) = self.dims2()?;
        let data = self.as_slice::<T>()?;
        Ok(data.chunks(cols.max(1)).map(|c| c.to_vec()).collect())
    }

    /// The values of a rank 3 tensor.
    pub fn to_vec3<T: WithDType>(&self) -> Result<Vec<Vec<Vec<T>>>> {
        let (_d0, d1, d2) = self.dims3()?;
        let data = self.as_slice::<T>()?;
        Ok(data
            .chunks((d1 * d2).max(1))
            .map(|plane| plane.chunks(d2.max(1)).map(|c| c.to_vec()).collect())
            .collect())
    }
}
