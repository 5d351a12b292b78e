//! ROI 二值掩膜及其邻域操作.

mod iter;

pub use iter::PosIter;

use super::point::{Grid, Point2d};
use crate::consts::gray::*;
use crate::error::{RoiError, RoiResult};
use crate::{Area2d, Areas2d, Idx2d, Predicate};
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Ix2, Zip};
use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

/// 一个 ROI 在一张切片上的二值掩膜, 下标为 `(h, w)`.
///
/// 像素值只有 `MASK_BACKGROUND` 和 `MASK_FOREGROUND` 两种. 形态学算法内部可能临时
/// 使用 `MASK_RESIDUE`, 但不会把它留在返回值中.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoiMask {
    data: Array2<u8>,
}

impl Index<Idx2d> for RoiMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for RoiMask {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl RoiMask {
    /// 全背景掩膜.
    pub fn new(grid: Grid) -> Self {
        Self {
            data: Array2::zeros(grid.shape()),
        }
    }

    /// 由前景像素坐标构造. 越界的坐标被静默丢弃.
    pub fn from_points<I: IntoIterator<Item = Point2d>>(grid: Grid, points: I) -> Self {
        let mut ans = Self::new(grid);
        for p in points {
            ans.set(p, MASK_FOREGROUND);
        }
        ans
    }

    /// 由谓词构造: `pred((h, w))` 为真的位置是前景.
    pub fn from_fn(grid: Grid, mut pred: impl FnMut(Idx2d) -> bool) -> Self {
        Self {
            data: Array2::from_shape_fn(grid.shape(), |pos| {
                if pred(pos) {
                    MASK_FOREGROUND
                } else {
                    MASK_BACKGROUND
                }
            }),
        }
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, u8, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u8> {
        self.data.get(pos)
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 掩膜所在的网格.
    #[inline]
    pub fn grid(&self) -> Grid {
        let (h, w) = self.shape();
        Grid::new(h, w)
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获得图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 检查索引是否越界.
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        h < self.height() && w < self.width()
    }

    /// 像素坐标 `p` 是否为前景. 越界视为背景.
    #[inline]
    pub fn is_foreground_at(&self, p: Point2d) -> bool {
        p.to_idx()
            .and_then(|idx| self.get(idx))
            .is_some_and(|&v| is_foreground(v))
    }

    /// 设置像素坐标 `p` 处的值. 越界时什么也不做, 返回 `false`.
    pub fn set(&mut self, p: Point2d, value: u8) -> bool {
        match p.to_idx().and_then(|idx| self.data.get_mut(idx)) {
            Some(v) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    /// 前景像素个数.
    #[inline]
    pub fn count_foreground(&self) -> usize {
        self.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 是否为全背景.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.iter().all(|p| is_background(*p))
    }

    /// 判断一个索引是否位于图像的边缘.
    #[inline]
    pub fn is_at_border(&self, (h, w): Idx2d) -> bool {
        h == 0
            || h.saturating_add(1) == self.height()
            || w == 0
            || w.saturating_add(1) == self.width()
    }

    /// 判断 `positions` 的索引是否全部都在图像的内部.
    #[inline]
    pub fn all_within(&self, positions: &[Idx2d]) -> bool {
        positions.iter().all(|p| !self.is_at_border(*p))
    }

    /// 获得 `pos` 的 4-邻域像素索引. 保证返回的索引都不越界.
    pub fn n4_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
        neighbour4(pos)
            .into_iter()
            .filter(|p| self.check(*p))
            .collect()
    }

    /// 获得 `pos` 的 8-邻域像素索引. 保证返回的索引都不越界.
    pub fn n8_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
        neighbour8(pos)
            .into_iter()
            .filter(|p| self.check(*p))
            .collect()
    }

    /// 以行优先规则, 获取能迭代图像所有索引的迭代器.
    #[inline]
    pub fn pos_iter(&self) -> PosIter {
        PosIter::new(self.shape())
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
        self.data.indexed_iter()
    }

    /// 将 `it` 中的所有位置设为 `new`.
    pub fn fill_batch<I: IntoIterator<Item = Idx2d>>(&mut self, it: I, new: u8) {
        for pos in it {
            self[pos] = new;
        }
    }

    /// 按照 4-相邻规则获取所有区域. 两个像素 `p1` 和 `p2` 属于同一个区域,
    /// 当且仅当存在一条从 `p1` 到 `p2` 的 4-相邻路径, 且路径上的所有像素
    /// (包括 `p1` 和 `p2`) 都满足谓词 `pred`.
    pub fn areas(&self, pred: Predicate) -> Areas2d {
        self.areas_from_local(self.pos_iter(), pred)
    }

    /// 按照 4-相邻原则获得图像中所有背景区域.
    #[inline]
    pub fn background_areas(&self) -> Areas2d {
        self.areas(is_background)
    }

    /// 按照 4-相邻原则获得图像中所有前景区域.
    #[inline]
    pub fn foreground_areas(&self) -> Areas2d {
        self.areas(is_foreground)
    }

    /// 按照 4-相邻规则获取所有区域, 但区域的起点由 `it` 指定.
    /// 区域按照起点在 `it` 中首次出现的顺序排列.
    pub fn areas_from_local<I: IntoIterator<Item = Idx2d>>(&self, it: I, pred: Predicate) -> Areas2d {
        let mut ans = Areas2d::with_capacity(1);
        let mut bfs_q = VecDeque::with_capacity(4);
        let mut visited = Array2::from_elem(self.shape(), false);

        for pos in it {
            if visited[pos] || !pred(self[pos]) {
                continue;
            }
            visited[pos] = true;
            bfs_q.push_back(pos);
            let mut this_area = Area2d::with_capacity(1);
            while let Some(cur_pos) = bfs_q.pop_front() {
                this_area.push(cur_pos);
                for neigh in neighbour4(cur_pos) {
                    if self.check(neigh) && !visited[neigh] && pred(self[neigh]) {
                        visited[neigh] = true;
                        bfs_q.push_back(neigh);
                    }
                }
            }
            ans.push(this_area);
        }
        ans
    }

    fn check_grid(&self, other: &Self) -> RoiResult<()> {
        if self.grid() == other.grid() {
            Ok(())
        } else {
            Err(RoiError::GeometryMismatch {
                left: self.grid(),
                right: other.grid(),
            })
        }
    }

    fn combine(&self, other: &Self, f: impl Fn(bool, bool) -> bool) -> RoiResult<Self> {
        self.check_grid(other)?;
        let data = Zip::from(&self.data).and(&other.data).map_collect(|&a, &b| {
            if f(is_foreground(a), is_foreground(b)) {
                MASK_FOREGROUND
            } else {
                MASK_BACKGROUND
            }
        });
        Ok(Self { data })
    }

    /// 像素集合的并.
    pub fn union(&self, other: &Self) -> RoiResult<Self> {
        self.combine(other, |a, b| a || b)
    }

    /// 像素集合的交.
    pub fn intersection(&self, other: &Self) -> RoiResult<Self> {
        self.combine(other, |a, b| a && b)
    }

    /// 像素集合的差 `self \ other`.
    pub fn difference(&self, other: &Self) -> RoiResult<Self> {
        self.combine(other, |a, b| a && !b)
    }

    /// `self` 的前景是否都是 `other` 的前景. 网格不同时返回 `false`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.grid() == other.grid()
            && Zip::from(&self.data)
                .and(&other.data)
                .all(|&a, &b| !is_foreground(a) || is_foreground(b))
    }
}
