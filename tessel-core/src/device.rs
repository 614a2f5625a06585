use crate::runtime;
use crate::Result;

/// A device location, only used for error reporting so that mismatches can
/// name both sides without holding on to the device itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeviceLocation {
    Cpu,
    Accel { ordinal: usize },
}

impl std::fmt::Display for DeviceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Accel { ordinal } => write!(f, "accel:{ordinal}"),
        }
    }
}

/// The device on which a tensor lives: the host CPU or one ordinal of the
/// accelerator family registered for this process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Accel(usize),
}

impl Device {
    pub fn location(&self) -> DeviceLocation {
        match self {
            Self::Cpu => DeviceLocation::Cpu,
            Self::Accel(ordinal) => DeviceLocation::Accel { ordinal: *ordinal },
        }
    }

    pub fn is_cpu(&self) -> bool {
        matches!(self, Self::Cpu)
    }

    pub fn same_device(&self, rhs: &Self) -> bool {
        self == rhs
    }

    /// Blocks until all work queued on this device has completed. A no-op
    /// for the CPU.
    pub fn synchronize(&self) -> Result<()> {
        match self {
            Self::Cpu => Ok(()),
            Self::Accel(ordinal) => {
                let rt = runtime::runtime();
                rt.set_device(*ordinal)?;
                rt.synchronize()
            }
        }
    }
}
