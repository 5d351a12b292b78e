//! 剖面采样: 沿用户画出的线段采样像素值, 计算沿线距离, 并按阈值区间高亮.
//!
//! 距离轴从起点指向终点. 阈值区间判断使用到 **终点** 的原始像素距离.

use crate::consts::DEFAULT_TRANSECT_THRESHOLDS;
use crate::data::point::{euclidean_distance, Point2d};
use crate::data::scan::ScanSlice;
use crate::error::{RoiError, RoiResult};
use crate::raster::{rasterize_line_within, PolylinePath};
use itertools::izip;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 剖面距离轴的缩放方式.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DistanceScaling {
    /// 物理距离 (mm): `sqrt((dx·col_mm)² + (dy·row_mm)²)`.
    #[default]
    Millimetre,

    /// 像素距离乘以 `row_mm / col_mm`. 旧版报告使用该方式.
    AspectRatio,
}

/// 剖面高亮区间 `[low, high]`, 单位为像素.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransectThresholds {
    low: f64,
    high: f64,
}

impl TransectThresholds {
    /// 构造区间. 非有限或 `low > high` 时返回 `None`.
    pub fn new(low: f64, high: f64) -> Option<Self> {
        (low.is_finite() && high.is_finite() && low <= high).then_some(Self { low, high })
    }

    /// 下界.
    #[inline]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// 上界.
    #[inline]
    pub fn high(&self) -> f64 {
        self.high
    }

    /// 闭区间判断.
    #[inline]
    pub fn contains(&self, d: f64) -> bool {
        (self.low..=self.high).contains(&d)
    }
}

impl Default for TransectThresholds {
    fn default() -> Self {
        let [low, high] = DEFAULT_TRANSECT_THRESHOLDS;
        Self { low, high }
    }
}

/// 一次剖面采样的结果. 只在显示时使用, 不持久化.
#[derive(Clone, Debug, PartialEq)]
pub struct Transect {
    /// 落在图像内的路径点, 从起点到终点.
    path: PolylinePath,
    /// 终点 (可能在图像外).
    terminal: Point2d,
    /// 与 `path` 一一对应的像素值.
    values: Vec<f32>,
    /// 已反转并缩放的距离轴.
    distances: Vec<f64>,
}

/// 剖面中落在高亮区间内的部分.
///
/// `distances` 已反转 (与 `Transect::distances` 同向, 未缩放), `values` 保持路径顺序.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransectBand {
    /// 区间内各点的像素值, 路径顺序.
    pub values: Vec<f32>,
    /// 区间内各点到终点的像素距离, 反转顺序.
    pub distances: Vec<f64>,
}

impl TransectBand {
    /// 高亮点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有高亮点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 沿 `start -> end` 采样 `slice`.
///
/// 越界的路径点被静默丢弃. `start == end` 时返回 `RoiError::InvalidGeometry`.
pub fn sample_transect(
    slice: &ScanSlice,
    start: Point2d,
    end: Point2d,
    scaling: DistanceScaling,
) -> RoiResult<Transect> {
    if start == end {
        return Err(RoiError::InvalidGeometry("transect endpoints coincide"));
    }
    let path = rasterize_line_within(start, end, slice.grid());

    let values: Vec<f32> = path.iter().filter_map(|p| slice.value_at(p)).collect();
    let spacing = slice.spacing();
    let distances: Vec<f64> = path
        .points()
        .iter()
        .rev()
        .map(|p| match scaling {
            DistanceScaling::AspectRatio => euclidean_distance(*p, end) * spacing.aspect_ratio(),
            DistanceScaling::Millimetre => spacing.physical_length(
                f64::from(p.x) - f64::from(end.x),
                f64::from(p.y) - f64::from(end.y),
            ),
        })
        .collect();
    debug_assert_eq!(values.len(), distances.len());

    log::debug!(
        "transect {:?} -> {:?}: {} points in bounds",
        start,
        end,
        path.len()
    );
    Ok(Transect {
        path,
        terminal: end,
        values,
        distances,
    })
}

impl Transect {
    /// 落在图像内的路径.
    #[inline]
    pub fn path(&self) -> &PolylinePath {
        &self.path
    }

    /// 终点.
    #[inline]
    pub fn terminal(&self) -> Point2d {
        self.terminal
    }

    /// 像素值, 路径顺序.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// 距离轴, 已反转并缩放.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// 采样点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否整条线段都在图像外.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 以 `thresholds` 重新遍历路径, 提取到终点像素距离落在区间内的点.
    ///
    /// 每次调用都从路径点重新计算距离, 因此显示时可以随意更换阈值.
    pub fn classify(&self, thresholds: TransectThresholds) -> TransectBand {
        let mut band = TransectBand::default();
        for (p, v) in izip!(self.path.iter(), self.values.iter().copied()) {
            let d = euclidean_distance(p, self.terminal);
            if thresholds.contains(d) {
                band.values.push(v);
                band.distances.push(d);
            }
        }
        band.distances.reverse();
        band
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::point::{Grid, PixelSpacing};
    use crate::data::scan::OwnedScanSlice;

    fn ramp(grid: Grid, spacing: PixelSpacing) -> OwnedScanSlice {
        let values = (0..grid.size()).map(|i| (i % grid.width()) as f32).collect();
        OwnedScanSlice::from_row_major(grid, values, spacing).unwrap()
    }

    #[test]
    fn test_zero_grid_short_line_has_empty_band() {
        let owned = OwnedScanSlice::zeros(Grid::standard(), PixelSpacing::unit());
        let t = sample_transect(
            &owned.as_immutable(),
            Point2d::new(0, 0),
            Point2d::new(3, 0),
            DistanceScaling::default(),
        )
        .unwrap();
        assert_eq!(t.values(), &[0.0; 4]);
        assert_eq!(t.distances(), &[0.0, 1.0, 2.0, 3.0]);
        assert!(t.classify(TransectThresholds::default()).is_empty());
    }

    #[test]
    fn test_zero_length_is_invalid() {
        let owned = OwnedScanSlice::zeros(Grid::new(8, 8), PixelSpacing::unit());
        let p = Point2d::new(2, 2);
        assert!(matches!(
            sample_transect(&owned.as_immutable(), p, p, DistanceScaling::Millimetre),
            Err(RoiError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_out_of_bounds_points_dropped() {
        let owned = ramp(Grid::new(4, 4), PixelSpacing::unit());
        let t = sample_transect(
            &owned.as_immutable(),
            Point2d::new(-2, 1),
            Point2d::new(5, 1),
            DistanceScaling::Millimetre,
        )
        .unwrap();
        assert_eq!(t.values(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(t.path().len(), 4);
        // 到终点 (5, 1) 的距离 5, 4, 3, 2, 反转后为 2, 3, 4, 5.
        assert_eq!(t.distances(), &[2.0, 3.0, 4.0, 5.0]);

        let outside = sample_transect(
            &owned.as_immutable(),
            Point2d::new(-9, -9),
            Point2d::new(-1, -9),
            DistanceScaling::Millimetre,
        )
        .unwrap();
        assert!(outside.is_empty());
    }

    #[test]
    fn test_far_endpoint() {
        let owned = ramp(Grid::standard(), PixelSpacing::unit());
        let end = Point2d::new(i32::MAX, 7);
        let t = sample_transect(
            &owned.as_immutable(),
            Point2d::new(0, 7),
            end,
            DistanceScaling::Millimetre,
        )
        .unwrap();
        assert_eq!(t.len(), 512);
        assert_eq!(t.values().first(), Some(&0.0));
        assert_eq!(t.values().last(), Some(&511.0));
        assert_eq!(t.terminal(), end);
        assert!(t.classify(TransectThresholds::default()).is_empty());
    }

    #[test]
    fn test_scaling() {
        let spacing = PixelSpacing::new(2.0, 0.5).unwrap();
        let owned = ramp(Grid::new(16, 16), spacing);
        let s = owned.as_immutable();

        let line = |a: (i32, i32), b: (i32, i32), scaling| {
            sample_transect(&s, a.into(), b.into(), scaling).unwrap()
        };

        let aspect = line((0, 0), (4, 0), DistanceScaling::AspectRatio);
        assert_eq!(aspect.distances(), &[0.0, 4.0, 8.0, 12.0, 16.0]);

        let mm = line((0, 0), (4, 0), DistanceScaling::Millimetre);
        assert_eq!(mm.distances(), &[0.0, 0.5, 1.0, 1.5, 2.0]);

        let vertical = line((1, 0), (1, 2), DistanceScaling::Millimetre);
        assert_eq!(vertical.distances(), &[0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_classify_band() {
        let owned = ramp(Grid::new(64, 64), PixelSpacing::unit());
        let t = sample_transect(
            &owned.as_immutable(),
            Point2d::new(0, 5),
            Point2d::new(50, 5),
            DistanceScaling::Millimetre,
        )
        .unwrap();
        let band = t.classify(TransectThresholds::default());
        // 到 x = 50 的距离落在 [10, 40] 的点: x = 10..=40.
        assert_eq!(band.len(), 31);
        assert_eq!(band.values.first(), Some(&10.0));
        assert_eq!(band.values.last(), Some(&40.0));
        assert_eq!(band.distances.first(), Some(&10.0));
        assert_eq!(band.distances.last(), Some(&40.0));

        // 更换阈值后重新分类.
        let narrow = t.classify(TransectThresholds::new(0.0, 2.0).unwrap());
        assert_eq!(narrow.values, vec![48.0, 49.0, 50.0]);
        assert_eq!(narrow.distances, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_thresholds() {
        assert!(TransectThresholds::new(5.0, 1.0).is_none());
        assert!(TransectThresholds::new(f64::NAN, 1.0).is_none());
        let t = TransectThresholds::default();
        assert!(t.contains(10.0) && t.contains(40.0) && !t.contains(40.5));
    }
}
