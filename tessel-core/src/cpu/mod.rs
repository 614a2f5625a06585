pub mod kernels;

pub use kernels::VecOps;
