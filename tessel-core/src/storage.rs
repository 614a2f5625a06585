use crate::runtime::{self, DeviceRuntime};
use crate::{Device, Result};
use std::ptr::NonNull;
use std::sync::Arc;

/// A reference-counted byte buffer living on a specific device.
///
/// Storages are only created through the device runtime and freed through
/// it when the last owner is dropped. Tensors share ownership of their
/// storage; the tensor layer never addresses past `size_in_bytes`.
pub struct Storage {
    ptr: NonNull<u8>,
    size: usize,
    device: Device,
    runtime: Arc<dyn DeviceRuntime>,
}

// The runtime is Send + Sync and the buffer is only dropped once, when the
// last Arc goes away.
unsafe impl Send for Storage {}
unsafe impl Sync for Storage {}

impl Storage {
    pub(crate) fn new(size: usize, device: Device) -> Result<Arc<Self>> {
        let rt = runtime::runtime();
        let ptr = match device {
            Device::Cpu => rt.alloc_host(size)?,
            Device::Accel(ordinal) => {
                rt.set_device(ordinal)?;
                rt.alloc_device(size)?
            }
        };
        tracing::trace!(size, device = %device.location(), "storage alloc");
        Ok(Arc::new(Self {
            ptr,
            size,
            device,
            runtime: rt,
        }))
    }

    /// Raw pointer to the start of the buffer, addressable on `device`.
    pub fn memory(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        tracing::trace!(size = self.size, device = %self.device.location(), "storage free");
        unsafe {
            match self.device {
                Device::Cpu => self.runtime.free_host(self.ptr, self.size),
                Device::Accel(_) => self.runtime.free_device(self.ptr, self.size),
            }
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Storage[{} bytes on {}]",
            self.size,
            self.device.location()
        )
    }
}
