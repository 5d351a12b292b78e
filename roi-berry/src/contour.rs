//! 轮廓, 轮廓集合与 ROI.

use crate::data::mask::RoiMask;
use crate::data::point::{Grid, Point2d};
use crate::raster::{fill_contours, point_in_polygon, signed_area2, trace_boundaries, VertexFrame};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 闭合的裂缝多边形. 顶点 `(x, y)` 为像素 `(x, y)` 的左上角, 末点隐式连回首点.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point2d>,
}

impl Contour {
    /// 由顶点序列构造.
    #[inline]
    pub fn new(points: Vec<Point2d>) -> Self {
        Self { points }
    }

    /// 所有顶点.
    #[inline]
    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// 顶点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否没有顶点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 有向面积 (像素²). 屏幕坐标中顺时针为正.
    #[inline]
    pub fn signed_area(&self) -> f64 {
        signed_area2(&self.points) as f64 / 2.0
    }

    /// 是否为空洞边界 (逆时针).
    #[inline]
    pub fn is_hole(&self) -> bool {
        signed_area2(&self.points) < 0
    }

    /// 判断像素 `p` 的中心是否在该多边形内.
    pub fn contains_pixel(&self, p: Point2d) -> bool {
        let poly: Vec<(f64, f64)> = self.points.iter().map(|v| v.to_f64()).collect();
        let (x, y) = p.to_f64();
        point_in_polygon((x + 0.5, y + 0.5), &poly)
    }

    /// 包围盒 `(左上, 右下)`, 空轮廓返回 `None`.
    pub fn bounding_box(&self) -> Option<(Point2d, Point2d)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (
                Point2d::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2d::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// 取出底层数据.
    #[inline]
    pub fn into_points(self) -> Vec<Point2d> {
        self.points
    }
}

/// 一个 ROI 在一张切片上的所有轮廓 (外边界与空洞边界), 以奇偶规则解释.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContourSet {
    contours: Vec<Contour>,
}

impl ContourSet {
    /// 空集合.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 追踪掩膜前景得到轮廓集合.
    pub fn from_mask(mask: &RoiMask) -> Self {
        trace_boundaries(mask).into_iter().map(Contour::new).collect()
    }

    /// 以奇偶规则栅格化到 `grid`.
    pub fn rasterize(&self, grid: Grid) -> RoiMask {
        fill_contours(
            self.contours.iter().map(Contour::points),
            VertexFrame::Corner,
            grid,
        )
    }

    /// 轮廓个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// 是否不含任何轮廓.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// 追加一个轮廓.
    #[inline]
    pub fn push(&mut self, contour: Contour) {
        self.contours.push(contour);
    }

    /// 迭代所有轮廓.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.contours.iter()
    }

    /// 所有轮廓有向面积之和, 即奇偶规则下的像素面积 (对引擎产生的轮廓精确).
    pub fn area(&self) -> f64 {
        self.contours.iter().map(Contour::signed_area).sum()
    }
}

impl FromIterator<Contour> for ContourSet {
    fn from_iter<T: IntoIterator<Item = Contour>>(iter: T) -> Self {
        Self {
            contours: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ContourSet {
    type Item = Contour;
    type IntoIter = std::vec::IntoIter<Contour>;

    fn into_iter(self) -> Self::IntoIter {
        self.contours.into_iter()
    }
}

impl<'a> IntoIterator for &'a ContourSet {
    type Item = &'a Contour;
    type IntoIter = std::slice::Iter<'a, Contour>;

    fn into_iter(self) -> Self::IntoIter {
        self.contours.iter()
    }
}

/// 结构集分配的 ROI 编号.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoiId(pub u32);

/// ROI 的一份拥有所有权的快照: 名称, 网格与逐切片的轮廓.
///
/// 交给几何引擎的 ROI 都是快照, 引擎从不修改它们.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Roi {
    id: Option<RoiId>,
    name: String,
    grid: Grid,
    slices: BTreeMap<usize, ContourSet>,
    revision: u64,
}

impl Roi {
    /// 尚未存入结构集的草稿 ROI.
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            id: None,
            name: name.into(),
            grid,
            slices: BTreeMap::new(),
            revision: 0,
        }
    }

    pub(crate) fn stored(
        id: RoiId,
        name: String,
        grid: Grid,
        slices: BTreeMap<usize, ContourSet>,
        revision: u64,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            grid,
            slices,
            revision,
        }
    }

    /// 设置某切片的轮廓. 空集合会移除该切片.
    pub fn with_slice(mut self, slice: usize, contours: ContourSet) -> Self {
        self.set_slice(slice, contours);
        self
    }

    /// 设置某切片的轮廓. 空集合会移除该切片.
    pub fn set_slice(&mut self, slice: usize, contours: ContourSet) {
        if contours.is_empty() {
            self.slices.remove(&slice);
        } else {
            self.slices.insert(slice, contours);
        }
    }

    /// 以掩膜设置某切片.
    pub fn set_slice_mask(&mut self, slice: usize, mask: &RoiMask) {
        self.set_slice(slice, ContourSet::from_mask(mask));
    }

    /// 结构集编号. 草稿为 `None`.
    #[inline]
    pub fn id(&self) -> Option<RoiId> {
        self.id
    }

    /// 名称.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 网格.
    #[inline]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// 快照时的修订号.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 含有轮廓的切片.
    #[inline]
    pub fn slices(&self) -> &BTreeMap<usize, ContourSet> {
        &self.slices
    }

    /// 某切片上的轮廓.
    #[inline]
    pub fn contours_at(&self, slice: usize) -> Option<&ContourSet> {
        self.slices.get(&slice)
    }

    /// 某切片上的掩膜. 没有轮廓的切片是全背景.
    pub fn mask_at(&self, slice: usize) -> RoiMask {
        match self.slices.get(&slice) {
            Some(cs) => cs.rasterize(self.grid),
            None => RoiMask::new(self.grid),
        }
    }

    /// 是否在任何切片上都没有轮廓.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}
