//! Output schemas and cell ranges.
pub(crate) mod column;
pub(crate) mod range;
