use super::point::{Grid, PixelSpacing, Point2d};
use crate::Idx2d;
use ndarray::{Array2, ArrayView2};
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 不可变、借用的二维 DICOM 切片 (像素值 + 像素间距). 几何引擎对其只读.
#[derive(Clone, Copy, Debug)]
pub struct ScanSlice<'a> {
    /// 行优先的像素值视图, 下标为 `(h, w)`.
    data: ArrayView2<'a, f32>,
    spacing: PixelSpacing,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> ScanSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub fn new(data: ArrayView2<'a, f32>, spacing: PixelSpacing) -> Self {
        Self { data, spacing }
    }

    /// 像素间距.
    #[inline]
    pub fn spacing(&self) -> PixelSpacing {
        self.spacing
    }

    /// 获取像素坐标 `p` 处的像素值. 越界时返回 `None`.
    #[inline]
    pub fn value_at(&self, p: Point2d) -> Option<f32> {
        self.data.get(p.to_idx()?).copied()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 图像所在的网格.
    #[inline]
    pub fn grid(&self) -> Grid {
        let (h, w) = self.shape();
        Grid::new(h, w)
    }
}

/// 拥有所有权的二维切片.
///
/// `OwnedScanSlice` 仅提供到 `ScanSlice` 的轻量转换.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OwnedScanSlice {
    data: Array2<f32>,
    spacing: PixelSpacing,
}

impl OwnedScanSlice {
    /// 由行优先数组构造.
    #[inline]
    pub fn new(data: Array2<f32>, spacing: PixelSpacing) -> Self {
        Self { data, spacing }
    }

    /// 全零切片.
    pub fn zeros(grid: Grid, spacing: PixelSpacing) -> Self {
        Self::new(Array2::zeros(grid.shape()), spacing)
    }

    /// 由行优先的 `Vec` 构造. 长度与 `grid` 不符时返回 `None`.
    pub fn from_row_major(grid: Grid, values: Vec<f32>, spacing: PixelSpacing) -> Option<Self> {
        let data = Array2::from_shape_vec(grid.shape(), values).ok()?;
        Some(Self::new(data, spacing))
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immutable(&self) -> ScanSlice<'_> {
        ScanSlice::new(self.data.view(), self.spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let grid = Grid::new(2, 3);
        let owned =
            OwnedScanSlice::from_row_major(grid, vec![0., 1., 2., 3., 4., 5.], PixelSpacing::unit())
                .unwrap();
        let s = owned.as_immutable();
        assert_eq!(s.shape(), (2, 3));
        assert_eq!(s.grid(), grid);
        // (x, y) = (列, 行)
        assert_eq!(s.value_at(Point2d::new(2, 0)), Some(2.0));
        assert_eq!(s.value_at(Point2d::new(0, 1)), Some(3.0));
        assert_eq!(s.value_at(Point2d::new(3, 0)), None);
        assert_eq!(s[(1, 2)], 5.0);

        assert!(OwnedScanSlice::from_row_major(grid, vec![0.; 5], PixelSpacing::unit()).is_none());
    }
}
