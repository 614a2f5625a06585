//! Pretty printing of tensor values. Half-precision values are promoted to
//! f32 for display.
use crate::{DType, Tensor};
use half::{bf16, f16};

fn fmt_elem(
    f: &mut std::fmt::Formatter<'_>,
    dtype: DType,
    ptr: *const u8,
) -> std::fmt::Result {
    unsafe {
        match dtype {
            DType::Byte => write!(f, "{}", *(ptr as *const i8)),
            DType::Bool => write!(f, "{}", *ptr != 0),
            DType::I8 => write!(f, "{}", *(ptr as *const i8)),
            DType::I16 => write!(f, "{}", *(ptr as *const i16)),
            DType::I32 => write!(f, "{}", *(ptr as *const i32)),
            DType::I64 => write!(f, "{}", *(ptr as *const i64)),
            DType::U8 => write!(f, "{}", *ptr),
            DType::U16 => write!(f, "{}", *(ptr as *const u16)),
            DType::U32 => write!(f, "{}", *(ptr as *const u32)),
            DType::U64 => write!(f, "{}", *(ptr as *const u64)),
            DType::F16 => write!(f, "{}", (*(ptr as *const f16)).to_f32()),
            DType::BF16 => write!(f, "{}", (*(ptr as *const bf16)).to_f32()),
            DType::F32 => write!(f, "{}", *(ptr as *const f32)),
            DType::F64 => write!(f, "{}", *(ptr as *const f64)),
        }
    }
}

impl std::fmt::Display for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Tensor[dims {:?}; strides {:?}; {}; {}]",
            self.dims(),
            self.strides(),
            self.dtype(),
            self.device().location()
        )?;
        if !self.device().is_cpu() {
            return write!(f, "<device memory>");
        }
        let base = self.data_ptr() as *const u8;
        let elem_size = self.element_size() as isize;
        // Elements are walked in shape order; rows of the last dimension go
        // one per line.
        let row = self.dims().last().copied().unwrap_or(1).max(1);
        for (i, offset) in self.layout().strided_index().enumerate() {
            if i % row == 0 {
                write!(f, "{}[", if i == 0 { "" } else { "]\n" })?;
            } else {
                write!(f, ", ")?;
            }
            fmt_elem(f, self.dtype(), base.wrapping_offset(offset * elem_size))?;
        }
        if self.elem_count() > 0 {
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tensor[{:?}; {}; {}]",
            self.dims(),
            self.dtype(),
            self.device().location()
        )
    }
}
