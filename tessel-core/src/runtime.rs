//! The narrow allocation/copy/synchronize surface a device runtime has to
//! provide. The CPU-only configuration is served by [`HostRuntime`]; an
//! accelerator family plugs in through [`register_runtime`], at most once
//! per process.
use crate::{Error, Result};
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};

/// Direction of a synchronous memory copy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemcpyKind {
    HostToHost,
    HostToDevice,
    DeviceToHost,
    DeviceToDevice,
}

/// Provider of raw memory and synchronous transfers for one device family.
///
/// All calls are blocking from the caller's point of view; implementations
/// hide any internal asynchrony behind `memcpy_sync` and `synchronize`.
/// Failures are surfaced as [`Error::Runtime`] and are never retried.
pub trait DeviceRuntime: Send + Sync + 'static {
    /// Allocates `size` bytes of zeroed host memory. Accelerator runtimes
    /// are expected to return pinned memory here.
    fn alloc_host(&self, size: usize) -> Result<NonNull<u8>>;

    /// # Safety
    ///
    /// `ptr` must come from `alloc_host` on this runtime with the same
    /// `size`, and must not be used afterwards.
    unsafe fn free_host(&self, ptr: NonNull<u8>, size: usize);

    /// Allocates `size` bytes on the current device.
    fn alloc_device(&self, size: usize) -> Result<NonNull<u8>>;

    /// # Safety
    ///
    /// `ptr` must come from `alloc_device` on this runtime with the same
    /// `size`, and must not be used afterwards.
    unsafe fn free_device(&self, ptr: NonNull<u8>, size: usize);

    /// # Safety
    ///
    /// `dst` and `src` must be valid for `size` bytes on the sides named by
    /// `kind`.
    unsafe fn memcpy_sync(
        &self,
        dst: *mut u8,
        src: *const u8,
        size: usize,
        kind: MemcpyKind,
    ) -> Result<()>;

    /// Blocks until all queued device work has completed.
    fn synchronize(&self) -> Result<()>;

    /// Selects the current device for subsequent calls on this thread.
    fn set_device(&self, ordinal: usize) -> Result<()>;
}

/// Host-only runtime backed by the system allocator.
pub struct HostRuntime;

// Cache-line alignment, also satisfies every dtype.
const HOST_ALIGN: usize = 64;

impl DeviceRuntime for HostRuntime {
    fn alloc_host(&self, size: usize) -> Result<NonNull<u8>> {
        // Zero-sized tensors still get a live buffer so that pointer
        // arithmetic stays in bounds.
        let layout = std::alloc::Layout::from_size_align(size.max(1), HOST_ALIGN)
            .map_err(|e| Error::Runtime {
                op: "alloc-host",
                msg: e.to_string(),
            })?;
        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).ok_or_else(|| Error::Runtime {
            op: "alloc-host",
            msg: format!("allocation of {size} bytes failed"),
        })
    }

    unsafe fn free_host(&self, ptr: NonNull<u8>, size: usize) {
        let layout = std::alloc::Layout::from_size_align_unchecked(size.max(1), HOST_ALIGN);
        std::alloc::dealloc(ptr.as_ptr(), layout)
    }

    fn alloc_device(&self, _size: usize) -> Result<NonNull<u8>> {
        Err(Error::Runtime {
            op: "alloc-device",
            msg: "no accelerator runtime registered".to_string(),
        })
    }

    unsafe fn free_device(&self, _ptr: NonNull<u8>, _size: usize) {}

    unsafe fn memcpy_sync(
        &self,
        dst: *mut u8,
        src: *const u8,
        size: usize,
        kind: MemcpyKind,
    ) -> Result<()> {
        match kind {
            MemcpyKind::HostToHost => {
                std::ptr::copy_nonoverlapping(src, dst, size);
                Ok(())
            }
            _ => Err(Error::Runtime {
                op: "memcpy",
                msg: format!("no accelerator runtime registered for {kind:?} copy"),
            }),
        }
    }

    fn synchronize(&self) -> Result<()> {
        Ok(())
    }

    fn set_device(&self, ordinal: usize) -> Result<()> {
        if ordinal == 0 {
            Ok(())
        } else {
            Err(Error::Runtime {
                op: "set-device",
                msg: format!("host runtime has a single device, got ordinal {ordinal}"),
            })
        }
    }
}

static RUNTIME: OnceLock<Arc<dyn DeviceRuntime>> = OnceLock::new();

/// Registers the accelerator runtime for this process. Exactly one family
/// can be active; a second registration fails.
pub fn register_runtime(rt: Arc<dyn DeviceRuntime>) -> Result<()> {
    RUNTIME
        .set(rt)
        .map_err(|_| Error::Msg("a device runtime is already registered".to_string()))
}

/// The active runtime: the registered accelerator runtime if any, the host
/// runtime otherwise. Host allocations also go through the accelerator
/// runtime when one is registered so that they can be pinned.
pub(crate) fn runtime() -> Arc<dyn DeviceRuntime> {
    static HOST: OnceLock<Arc<dyn DeviceRuntime>> = OnceLock::new();
    match RUNTIME.get() {
        Some(rt) => rt.clone(),
        None => HOST.get_or_init(|| Arc::new(HostRuntime)).clone(),
    }
}
