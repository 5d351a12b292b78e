//! 像素坐标, 切片与掩膜等基础数据结构.

pub mod mask;
pub mod point;
pub mod scan;

pub use mask::RoiMask;
pub use point::{euclidean_distance, in_bounds, Grid, PixelSpacing, Point2d};
pub use scan::{OwnedScanSlice, ScanSlice};
