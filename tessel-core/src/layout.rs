use crate::{Error, Result, Shape};

/// The shape, strides and start offset of a tensor.
///
/// Strides are signed and expressed in number of elements; the start offset
/// is expressed in bytes. The only place where the two units meet is the
/// raw indexing helper on `Tensor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    // The strides are given in number of elements and not in bytes.
    strides: Vec<isize>,
    // The offset from the start of the underlying storage, in bytes.
    start_offset: usize,
}

impl Layout {
    pub fn new(shape: Shape, strides: Vec<isize>, start_offset: usize) -> Self {
        Self {
            shape,
            strides,
            start_offset,
        }
    }

    pub fn contiguous_with_offset<S: Into<Shape>>(shape: S, start_offset: usize) -> Self {
        let shape = shape.into();
        let strides = shape.stride_contiguous();
        Self {
            shape,
            strides,
            start_offset,
        }
    }

    pub fn contiguous<S: Into<Shape>>(shape: S) -> Self {
        Self::contiguous_with_offset(shape, 0)
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Whether the tensor is stride-packed row-major: the last stride is 1
    /// and every other stride is the product of the following dimensions.
    pub fn is_contiguous(&self) -> bool {
        let mut acc = 1isize;
        for (&stride, &dim) in self.strides.iter().zip(self.dims().iter()).rev() {
            if stride != acc {
                return false;
            }
            acc *= dim as isize;
        }
        true
    }

    /// The extent of the element offsets reachable from this layout, as a
    /// `(lo, hi)` pair with `hi` exclusive. Both bounds are in elements
    /// relative to the start offset; `lo` can be negative when strides are.
    pub(crate) fn elem_span(&self) -> (isize, isize) {
        if self.shape.elem_count() == 0 {
            return (0, 0);
        }
        let mut lo = 0isize;
        let mut hi = 0isize;
        for (&stride, &dim) in self.strides.iter().zip(self.dims().iter()) {
            let reach = (dim as isize - 1) * stride;
            if reach < 0 {
                lo += reach
            } else {
                hi += reach
            }
        }
        (lo, hi + 1)
    }

    pub(crate) fn permute(&self, idxs: &[usize]) -> Result<Self> {
        let is_permutation =
            idxs.len() == self.shape.rank() && (0..idxs.len()).all(|i| idxs.contains(&i));
        if !is_permutation {
            return Err(Error::InvalidPermutation {
                dims: idxs.to_vec(),
                shape: self.shape.clone(),
            }
            .bt());
        }
        let dims = self.dims();
        let shape: Vec<_> = idxs.iter().map(|&i| dims[i]).collect();
        let strides: Vec<_> = idxs.iter().map(|&i| self.strides[i]).collect();
        Ok(Self {
            shape: Shape::from(shape),
            strides,
            start_offset: self.start_offset,
        })
    }

    pub(crate) fn slice(
        &self,
        dim: usize,
        start: usize,
        end: usize,
        elem_size: usize,
        op: &'static str,
    ) -> Result<Self> {
        let dims = self.dims();
        if dim >= dims.len() {
            return Err(Error::DimOutOfRange {
                shape: self.shape.clone(),
                dim,
                op,
            }
            .bt());
        }
        if start > end || end > dims[dim] {
            return Err(Error::SliceInvalidArgs {
                shape: self.shape.clone(),
                dim,
                start,
                end,
                msg: "expected start <= end <= dim size",
                op,
            }
            .bt());
        }
        let mut dims = dims.to_vec();
        dims[dim] = end - start;
        // The stride along `dim` is in elements, the offset is in bytes.
        let delta = start as isize * self.strides[dim] * elem_size as isize;
        let start_offset = (self.start_offset as isize + delta) as usize;
        Ok(Self {
            shape: Shape::from(dims),
            strides: self.strides.clone(),
            start_offset,
        })
    }

    /// Iterator over the element offsets of this layout in row-major shape
    /// order, relative to the start offset.
    pub fn strided_index(&self) -> StridedIndex<'_> {
        StridedIndex::from_layout(self)
    }
}

/// An iterator over offset positions for items of an N-dimensional array
/// stored in a flat buffer using some potential strides.
#[derive(Debug)]
pub struct StridedIndex<'a> {
    next_storage_index: Option<isize>,
    multi_index: Vec<usize>,
    dims: &'a [usize],
    strides: &'a [isize],
}

impl<'a> StridedIndex<'a> {
    pub(crate) fn new(dims: &'a [usize], strides: &'a [isize]) -> Self {
        let elem_count: usize = dims.iter().product();
        let next_storage_index = if elem_count == 0 {
            None
        } else {
            // This applies to the scalar case too.
            Some(0)
        };
        StridedIndex {
            next_storage_index,
            multi_index: vec![0; dims.len()],
            dims,
            strides,
        }
    }

    pub(crate) fn from_layout(l: &'a Layout) -> Self {
        Self::new(l.dims(), l.strides())
    }
}

impl Iterator for StridedIndex<'_> {
    type Item = isize;

    fn next(&mut self) -> Option<Self::Item> {
        let storage_index = self.next_storage_index?;
        let mut updated = false;
        let mut next_storage_index = storage_index;
        for ((multi_i, max_i), stride_i) in self
            .multi_index
            .iter_mut()
            .zip(self.dims.iter())
            .zip(self.strides.iter())
            .rev()
        {
            let next_i = *multi_i + 1;
            if next_i < *max_i {
                *multi_i = next_i;
                updated = true;
                next_storage_index += stride_i;
                break;
            } else {
                next_storage_index -= *multi_i as isize * stride_i;
                *multi_i = 0
            }
        }
        self.next_storage_index = if updated {
            Some(next_storage_index)
        } else {
            None
        };
        Some(storage_index)
    }
}
