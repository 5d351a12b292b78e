use super::RoiOperation;
use crate::contour::{ContourSet, Roi};
use crate::data::mask::RoiMask;
use crate::data::point::Grid;
use crate::error::{RoiError, RoiResult};
use crate::morph::{dilate, erode};
use crate::outcome::Outcome;
use std::collections::{BTreeMap, BTreeSet};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

/// 所有操作数共同的网格.
pub(super) fn common_grid(op: &RoiOperation) -> RoiResult<Grid> {
    let operands = op.operands();
    let left = operands[0].grid();
    match operands.iter().map(|r| r.grid()).find(|g| *g != left) {
        Some(right) => Err(RoiError::GeometryMismatch { left, right }),
        None => Ok(left),
    }
}

/// 任一操作数有轮廓的切片.
fn slice_keys(op: &RoiOperation) -> BTreeSet<usize> {
    op.operands()
        .into_iter()
        .flat_map(|r| r.slices().keys().copied())
        .collect()
}

fn binary(
    a: &Roi,
    b: &Roi,
    k: usize,
    f: fn(&RoiMask, &RoiMask) -> RoiResult<RoiMask>,
) -> RoiResult<RoiMask> {
    f(&a.mask_at(k), &b.mask_at(k))
}

/// 在切片 `k` 上求值.
fn eval_slice(op: &RoiOperation, k: usize) -> RoiResult<RoiMask> {
    match op {
        RoiOperation::Expand { roi, margin } => Ok(dilate(&roi.mask_at(k), *margin)),
        RoiOperation::Contract { roi, margin } => Ok(erode(&roi.mask_at(k), *margin)),
        RoiOperation::InnerRind { roi, radii } => {
            let a = roi.mask_at(k);
            erode(&a, radii.inner()).difference(&erode(&a, radii.outer()))
        }
        RoiOperation::OuterRind { roi, radii } => {
            let a = roi.mask_at(k);
            dilate(&a, radii.outer()).difference(&dilate(&a, radii.inner()))
        }
        RoiOperation::Union(a, b) => binary(a, b, k, RoiMask::union),
        RoiOperation::Intersection(a, b) => binary(a, b, k, RoiMask::intersection),
        RoiOperation::Difference(a, b) => binary(a, b, k, RoiMask::difference),
    }
}

fn to_outcome(mask: RoiMask) -> Outcome<ContourSet> {
    if mask.is_empty() {
        Outcome::Empty
    } else {
        Outcome::Produced(ContourSet::from_mask(&mask))
    }
}

/// 逐切片求值. 切片之间互不依赖, 启用 `rayon` 时并行执行.
pub(super) fn eval_all(op: &RoiOperation) -> RoiResult<BTreeMap<usize, Outcome<ContourSet>>> {
    let keys = slice_keys(op);
    let eval = |k: usize| eval_slice(op, k).map(|m| (k, to_outcome(m)));
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            keys.into_par_iter().map(eval).collect()
        } else {
            keys.into_iter().map(eval).collect()
        }
    }
}
