//! 像素坐标, 网格与像素间距.

use crate::consts::GRID_SIZE;
use crate::Idx2d;
use num::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 整数像素坐标. `x` 为列, `y` 为行.
///
/// 可以越界 (例如用户把线段画到了图像外面), 越界的点在采样时被丢弃.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point2d {
    /// 列.
    pub x: i32,
    /// 行.
    pub y: i32,
}

impl Point2d {
    /// 构造像素坐标.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 转换为 `(h, w)` 索引. 任一分量为负时返回 `None`.
    #[inline]
    pub fn to_idx(self) -> Option<Idx2d> {
        Some((self.y.to_usize()?, self.x.to_usize()?))
    }

    /// 从 `(h, w)` 索引构造. 分量超出 `i32` 范围时返回 `None`.
    #[inline]
    pub fn from_idx((h, w): Idx2d) -> Option<Self> {
        Some(Self::new(w.to_i32()?, h.to_i32()?))
    }

    /// 转换为浮点坐标 `(x, y)`.
    #[inline]
    pub fn to_f64(self) -> (f64, f64) {
        (f64::from(self.x), f64::from(self.y))
    }
}

impl From<(i32, i32)> for Point2d {
    #[inline]
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// 两点之间的欧氏距离 (像素).
#[inline]
pub fn euclidean_distance(a: Point2d, b: Point2d) -> f64 {
    let dx = f64::from(a.x) - f64::from(b.x);
    let dy = f64::from(a.y) - f64::from(b.y);
    dx.hypot(dy)
}

/// 判断 `p` 是否落在 `width * height` 的图像内.
#[inline]
pub fn in_bounds(p: Point2d, width: usize, height: usize) -> bool {
    match p.to_idx() {
        Some((h, w)) => h < height && w < width,
        None => false,
    }
}

/// 切片网格的形状. 同一个 ROI 的所有切片共享同一个网格.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    height: usize,
    width: usize,
}

impl Grid {
    /// 构造网格.
    #[inline]
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// 标准 512×512 网格.
    #[inline]
    pub const fn standard() -> Self {
        Self::new(GRID_SIZE, GRID_SIZE)
    }

    /// 高 (行数).
    #[inline]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// 宽 (列数).
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// `(h, w)` 形式的形状.
    #[inline]
    pub const fn shape(&self) -> Idx2d {
        (self.height, self.width)
    }

    /// 像素总数.
    #[inline]
    pub const fn size(&self) -> usize {
        self.height * self.width
    }

    /// 判断像素坐标是否在网格内.
    #[inline]
    pub fn contains(&self, p: Point2d) -> bool {
        in_bounds(p, self.width, self.height)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::standard()
    }
}

/// 像素间距 (mm). `row_mm` 为相邻两行的距离, `col_mm` 为相邻两列的距离.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelSpacing {
    row_mm: f64,
    col_mm: f64,
}

impl PixelSpacing {
    /// 构造像素间距. 任一分量非有限或非正时返回 `None`.
    pub fn new(row_mm: f64, col_mm: f64) -> Option<Self> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        (ok(row_mm) && ok(col_mm)).then_some(Self { row_mm, col_mm })
    }

    /// 各向同性的单位间距 (1mm).
    #[inline]
    pub const fn unit() -> Self {
        Self {
            row_mm: 1.0,
            col_mm: 1.0,
        }
    }

    /// 行间距.
    #[inline]
    pub fn row_mm(&self) -> f64 {
        self.row_mm
    }

    /// 列间距.
    #[inline]
    pub fn col_mm(&self) -> f64 {
        self.col_mm
    }

    /// `row_mm / col_mm`.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.row_mm / self.col_mm
    }

    /// 像素位移 `(dx, dy)` 对应的物理距离.
    #[inline]
    pub fn physical_length(&self, dx: f64, dy: f64) -> f64 {
        (dx * self.col_mm).hypot(dy * self.row_mm)
    }
}

impl Default for PixelSpacing {
    fn default() -> Self {
        Self::unit()
    }
}
