mod boundary_offset;

pub use boundary_offset::{offset_inner, offset_outer, BoundaryOffset2D, OffsetSettings};
