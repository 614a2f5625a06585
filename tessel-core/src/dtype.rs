//! Types for elements of a tensor and the scalar conversions between them.
use crate::{Error, Result};
use half::{bf16, f16};

/// The different types of elements allowed in tensors.
///
/// `Byte` is a signed 8-bit character type. It shares the in-memory
/// representation of `I8` but is a distinct dtype and never reaches the
/// arithmetic kernels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DType {
    Byte,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    // Half-precision floating point.
    F16,
    // Brain floating point.
    BF16,
    F32,
    F64,
}

impl std::str::FromStr for DType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let dtype = match s {
            "byte" => Self::Byte,
            "bool" => Self::Bool,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "f16" => Self::F16,
            "bf16" => Self::BF16,
            "f32" => Self::F32,
            "f64" => Self::F64,
            _ => Err(Error::Msg(format!("cannot parse {s:?} as a dtype")).bt())?,
        };
        Ok(dtype)
    }
}

impl DType {
    /// String representation for dtypes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// The size used by each element in bytes, i.e. 2 for f16, 4 for f32.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::Byte | Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 | Self::F16 | Self::BF16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::BF16 | Self::F32 | Self::F64)
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait tying a Rust scalar type to its tensor dtype.
///
/// `to_f64`/`from_f64` form the pivot for scalar casts between any two
/// dtypes. Float to integer conversion rounds to nearest even and
/// saturates; boolean true maps to 1.
pub trait WithDType:
    Sized + Copy + Send + Sync + std::fmt::Debug + PartialEq + 'static
{
    const DTYPE: DType;

    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
}

macro_rules! with_dtype {
    ($ty:ty, $dtype:ident, $from_f64:expr, $to_f64:expr) => {
        impl WithDType for $ty {
            const DTYPE: DType = DType::$dtype;

            fn from_f64(v: f64) -> Self {
                $from_f64(v)
            }

            fn to_f64(self) -> f64 {
                $to_f64(self)
            }
        }
    };
}
macro_rules! int_with_dtype {
    ($ty:ty, $dtype:ident) => {
        // `as` saturates out-of-range floats, which is the narrowing
        // behavior we want after rounding ties to even.
        with_dtype!($ty, $dtype, |v: f64| v.round_ties_even() as $ty, |v: $ty| v as f64);
    };
}

int_with_dtype!(i8, I8);
int_with_dtype!(i16, I16);
int_with_dtype!(i32, I32);
int_with_dtype!(i64, I64);
int_with_dtype!(u8, U8);
int_with_dtype!(u16, U16);
int_with_dtype!(u32, U32);
int_with_dtype!(u64, U64);
with_dtype!(f16, F16, f16::from_f64, f16::to_f64);
with_dtype!(bf16, BF16, bf16::from_f64, bf16::to_f64);
with_dtype!(f32, F32, |v: f64| v as f32, |v: f32| v as f64);
with_dtype!(f64, F64, |v: f64| v, |v: f64| v);
with_dtype!(bool, Bool, |v: f64| v != 0., |v: bool| if v { 1. } else { 0. });

/// Scalar conversion between any two supported dtypes.
///
/// NaN and infinities are preserved by the float conversions; narrowing
/// from f32 to f16 follows round-to-nearest-even with out-of-range values
/// going to the matching infinity, and f16 subnormals are preserved.
pub fn cast<T: WithDType, U: WithDType>(v: T) -> U {
    U::from_f64(v.to_f64())
}

/// Float dtypes on which the kernels operate. Arithmetic is performed at
/// f32 precision, values are narrowed back on write.
pub trait FloatDType: WithDType + num_traits::NumAssign {
    fn to_f32(self) -> f32;
    fn from_f32(v: f32) -> Self;
}

impl FloatDType for f16 {
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    fn from_f32(v: f32) -> Self {
        f16::from_f32(v)
    }
}

impl FloatDType for bf16 {
    fn to_f32(self) -> f32 {
        bf16::to_f32(self)
    }

    fn from_f32(v: f32) -> Self {
        bf16::from_f32(v)
    }
}

impl FloatDType for f32 {
    fn to_f32(self) -> f32 {
        self
    }

    fn from_f32(v: f32) -> Self {
        v
    }
}
