//! 轮廓描绘: 把手绘笔画, 种子生长或画笔像素转换为一张切片上的闭合轮廓.
//!
//! 描绘结果是草稿, 可以随意丢弃. 只有 [`crate::store::StructureSet::commit`]
//! 才会修改结构集.

use crate::consts::{gray::*, ElemType, DEFAULT_MAX_INTERNAL_HOLE, DEFAULT_MAX_ISTHMUS_WIDTH};
use crate::contour::ContourSet;
use crate::data::mask::RoiMask;
use crate::data::point::Point2d;
use crate::data::scan::ScanSlice;
use crate::error::{RoiError, RoiResult};
use crate::morph::{cut_isthmuses, fill_holes};
use crate::outcome::Outcome;
use crate::raster::{fill_stroke, signed_area2};
use crate::Idx2d;
use binary_heap_plus::BinaryHeap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 描绘后处理的限制.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DrawLimits {
    /// 不超过该像素数的内部空洞会被自动填充.
    pub max_internal_hole: u32,

    /// 窄于该宽度的细颈会被切断. 不大于 1 时不切断.
    pub max_isthmus_width: u32,
}

impl Default for DrawLimits {
    fn default() -> Self {
        Self {
            max_internal_hole: DEFAULT_MAX_INTERNAL_HOLE,
            max_isthmus_width: DEFAULT_MAX_ISTHMUS_WIDTH,
        }
    }
}

/// 种子生长的像素值闭区间 `[lower, upper]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntensityWindow {
    lower: f32,
    upper: f32,
}

impl IntensityWindow {
    /// 构造窗口. 非有限或 `lower > upper` 时返回 `None`.
    pub fn new(lower: f32, upper: f32) -> Option<Self> {
        (lower.is_finite() && upper.is_finite() && lower <= upper).then_some(Self { lower, upper })
    }

    /// 给定像素值, 判断其在生长时的像素类型.
    #[inline]
    pub fn eval(&self, pix_val: f32) -> ElemType {
        if (self.lower..=self.upper).contains(&pix_val) {
            ElemType::Foreground
        } else {
            ElemType::Background
        }
    }
}

/// 描绘输入.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawInput {
    /// 手绘闭合笔画, 顶点为像素中心.
    Stroke(Vec<Point2d>),

    /// 从每个种子出发, 在 `window` 内做 4-连通生长.
    Seeds {
        /// 种子像素.
        points: Vec<Point2d>,
        /// 生长窗口.
        window: IntensityWindow,
    },

    /// 画笔直接选中的像素.
    Pixels(Vec<Point2d>),
}

/// 描绘结果.
#[derive(Clone, Debug, PartialEq)]
pub struct Traced {
    /// 后处理之后的掩膜.
    pub mask: RoiMask,
    /// `mask` 的轮廓.
    pub contours: ContourSet,
    /// 被填充的空洞个数.
    pub holes_filled: usize,
    /// 切断细颈时移除的像素数.
    pub isthmus_pixels_removed: usize,
}

/// 在 `slice` 上描绘 `input`, 并依次做空洞填充和细颈切断.
///
/// # 返回值
///
/// - 输入点列表为空时返回 `RoiError::InvalidGeometry`.
/// - 笔画围成的面积为零, 没有任何种子生长出像素, 或后处理之后为全背景时,
///   返回 `Outcome::Empty`.
pub fn trace(
    slice: &ScanSlice,
    input: &DrawInput,
    limits: DrawLimits,
) -> RoiResult<Outcome<Traced>> {
    TraceImp { slice, limits }.run(input)
}

struct TraceImp<'a, 'b> {
    slice: &'b ScanSlice<'a>,
    limits: DrawLimits,
}

impl TraceImp<'_, '_> {
    fn run(&self, input: &DrawInput) -> RoiResult<Outcome<Traced>> {
        let selected = match input {
            DrawInput::Stroke(points) => self.stroke(points)?,
            DrawInput::Seeds { points, window } => self.grow(points, *window)?,
            DrawInput::Pixels(points) => self.pixels(points)?,
        };
        Ok(match selected {
            Some(mask) => self.post_process(mask),
            None => Outcome::Empty,
        })
    }

    fn stroke(&self, points: &[Point2d]) -> RoiResult<Option<RoiMask>> {
        if points.is_empty() {
            return Err(RoiError::InvalidGeometry("empty stroke"));
        }
        if signed_area2(points) == 0 {
            log::debug!("stroke of {} points encloses no area", points.len());
            return Ok(None);
        }
        Ok(Some(fill_stroke(points, self.slice.grid())))
    }

    fn pixels(&self, points: &[Point2d]) -> RoiResult<Option<RoiMask>> {
        if points.is_empty() {
            return Err(RoiError::InvalidGeometry("empty pixel selection"));
        }
        let mask = RoiMask::from_points(self.slice.grid(), points.iter().copied());
        Ok(Some(mask))
    }

    /// 从每个种子出发, 按照到种子的距离由近到远生长.
    fn grow(&self, seeds: &[Point2d], window: IntensityWindow) -> RoiResult<Option<RoiMask>> {
        if seeds.is_empty() {
            return Err(RoiError::InvalidGeometry("empty seed list"));
        }
        let mut mask = RoiMask::new(self.slice.grid());
        let admit = |pos: Idx2d| window.eval(self.slice[pos]).is_foreground();

        for seed in seeds.iter().filter_map(|p| p.to_idx()) {
            if !mask.check(seed) || !admit(seed) || is_foreground(mask[seed]) {
                continue;
            }
            let dist2 =
                move |&(h, w): &Idx2d| h.abs_diff(seed.0).pow(2) + w.abs_diff(seed.1).pow(2);
            // 堆顶距种子最近
            let mut heap: BinaryHeap<Idx2d, _> =
                BinaryHeap::new_by(|a: &Idx2d, b: &Idx2d| dist2(b).cmp(&dist2(a)));
            heap.push(seed);
            mask[seed] = MASK_FOREGROUND;
            while let Some(pos) = heap.pop() {
                for neigh in mask.n4_positions(pos) {
                    if is_background(mask[neigh]) && admit(neigh) {
                        mask[neigh] = MASK_FOREGROUND;
                        heap.push(neigh);
                    }
                }
            }
        }

        if mask.is_empty() {
            log::debug!("no seed inside window {:?}", window);
            return Ok(None);
        }
        Ok(Some(mask))
    }

    fn post_process(&self, mask: RoiMask) -> Outcome<Traced> {
        let (mask, holes_filled) = fill_holes(&mask, self.limits.max_internal_hole);
        let (mask, isthmus_pixels_removed) = cut_isthmuses(&mask, self.limits.max_isthmus_width);
        log::debug!(
            "traced {} pixels, {} holes filled, {} isthmus pixels removed",
            mask.count_foreground(),
            holes_filled,
            isthmus_pixels_removed
        );
        if mask.is_empty() {
            return Outcome::Empty;
        }
        let contours = ContourSet::from_mask(&mask);
        Outcome::Produced(Traced {
            mask,
            contours,
            holes_filled,
            isthmus_pixels_removed,
        })
    }
}
