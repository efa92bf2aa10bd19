//! Standard functions

mod math;
mod aggregate;

pub use math::{Abs, Floor, Ceil, Round, Sqrt, Pow};
pub use aggregate::{Min, Max, Len};
