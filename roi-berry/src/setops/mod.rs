//! ROI 集合运算: 扩张, 收缩, 内环, 外环, 并, 交, 差.
//!
//! 所有运算都作用于 ROI 快照, 逐切片独立地在掩膜上进行, 然后重新追踪为轮廓.
//! 结果是一个新的 [`DerivedRoi`], 输入从不被修改.

mod imp;

use crate::contour::{ContourSet, Roi};
use crate::data::point::Grid;
use crate::error::{RoiError, RoiResult};
use crate::outcome::Outcome;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 有符号的像素边距. 正数扩张, 负数收缩.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Margin(pub i32);

impl Margin {
    /// 边距绝对值.
    #[inline]
    pub fn magnitude(&self) -> u32 {
        self.0.unsigned_abs()
    }

    /// 是否为扩张 (包括零边距).
    #[inline]
    pub fn is_expand(&self) -> bool {
        self.0 >= 0
    }
}

/// 环形运算的内外半径, 保证 `inner < outer`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RindRadii {
    inner: u32,
    outer: u32,
}

impl RindRadii {
    /// 构造半径对. `inner >= outer` 时返回 `RoiError::InvalidMargin`.
    pub fn new(inner: u32, outer: u32) -> RoiResult<Self> {
        if inner >= outer {
            return Err(RoiError::InvalidMargin { inner, outer });
        }
        Ok(Self { inner, outer })
    }

    /// 内半径.
    #[inline]
    pub fn inner(&self) -> u32 {
        self.inner
    }

    /// 外半径.
    #[inline]
    pub fn outer(&self) -> u32 {
        self.outer
    }
}

/// 一次集合运算及其操作数快照.
#[derive(Clone, Debug, PartialEq)]
pub enum RoiOperation {
    /// 以欧氏圆盘膨胀.
    Expand {
        /// 操作数.
        roi: Roi,
        /// 半径 (像素).
        margin: u32,
    },

    /// 以欧氏圆盘腐蚀. 网格之外视为背景.
    Contract {
        /// 操作数.
        roi: Roi,
        /// 半径 (像素).
        margin: u32,
    },

    /// `Contract(roi, inner) \ Contract(roi, outer)`.
    InnerRind {
        /// 操作数.
        roi: Roi,
        /// 内外半径.
        radii: RindRadii,
    },

    /// `Expand(roi, outer) \ Expand(roi, inner)`.
    OuterRind {
        /// 操作数.
        roi: Roi,
        /// 内外半径.
        radii: RindRadii,
    },

    /// 并集.
    Union(Roi, Roi),

    /// 交集.
    Intersection(Roi, Roi),

    /// 差集, 第一个操作数减去第二个.
    Difference(Roi, Roi),
}

impl RoiOperation {
    /// 有符号边距: 非负为扩张, 负数为收缩.
    pub fn with_margin(roi: Roi, margin: Margin) -> Self {
        if margin.is_expand() {
            Self::Expand {
                roi,
                margin: margin.magnitude(),
            }
        } else {
            Self::Contract {
                roi,
                margin: margin.magnitude(),
            }
        }
    }

    /// 运算名称.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Expand { .. } => "expand",
            Self::Contract { .. } => "contract",
            Self::InnerRind { .. } => "inner rind",
            Self::OuterRind { .. } => "outer rind",
            Self::Union(..) => "union",
            Self::Intersection(..) => "intersection",
            Self::Difference(..) => "difference",
        }
    }

    /// 所有操作数.
    pub fn operands(&self) -> Vec<&Roi> {
        match self {
            Self::Expand { roi, .. }
            | Self::Contract { roi, .. }
            | Self::InnerRind { roi, .. }
            | Self::OuterRind { roi, .. } => vec![roi],
            Self::Union(a, b) | Self::Intersection(a, b) | Self::Difference(a, b) => vec![a, b],
        }
    }
}

/// 集合运算产生的新 ROI. 每个被任一操作数占用的切片都有一个结果.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedRoi {
    name: String,
    grid: Grid,
    slices: BTreeMap<usize, Outcome<ContourSet>>,
    name_collision: bool,
}

impl DerivedRoi {
    /// 目标名称.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 网格.
    #[inline]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// 逐切片结果.
    #[inline]
    pub fn slices(&self) -> &BTreeMap<usize, Outcome<ContourSet>> {
        &self.slices
    }

    /// 目标名称在结构集中是否已经存在.
    #[inline]
    pub fn name_collision(&self) -> bool {
        self.name_collision
    }

    /// 是否所有切片都为空.
    pub fn is_empty(&self) -> bool {
        self.slices.values().all(Outcome::is_empty)
    }

    /// 非空切片的轮廓, 可直接用于提交.
    pub fn produced_slices(&self) -> BTreeMap<usize, ContourSet> {
        self.slices
            .iter()
            .filter_map(|(k, o)| match o {
                Outcome::Produced(cs) => Some((*k, cs.clone())),
                Outcome::Empty => None,
            })
            .collect()
    }

    /// 转换为草稿 ROI.
    pub fn into_roi(self) -> Roi {
        let mut roi = Roi::new(self.name, self.grid);
        for (k, o) in self.slices {
            if let Outcome::Produced(cs) = o {
                roi.set_slice(k, cs);
            }
        }
        roi
    }
}

/// 执行集合运算, 结果命名为 `destination`.
///
/// `existing_names` 为结构集中已有的 ROI 名称. 目标名称已存在 (区分大小写) 时,
/// 结果带有 `name_collision` 标记并记录一条警告, 但运算照常进行.
///
/// # 返回值
///
/// 二元运算的操作数网格不同时返回 `RoiError::GeometryMismatch`.
pub fn apply<S: AsRef<str>>(
    op: &RoiOperation,
    destination: &str,
    existing_names: &[S],
) -> RoiResult<DerivedRoi> {
    let grid = imp::common_grid(op)?;
    let name_collision = existing_names.iter().any(|n| n.as_ref() == destination);
    if name_collision {
        log::warn!("ROI `{destination}` already exists, {} result will replace it", op.name());
    }

    let slices = imp::eval_all(op)?;
    log::info!(
        "{} -> `{}`: {} slices, {} empty",
        op.name(),
        destination,
        slices.len(),
        slices.values().filter(|o| o.is_empty()).count()
    );
    Ok(DerivedRoi {
        name: destination.to_string(),
        grid,
        slices,
        name_collision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mask::RoiMask;

    const NO_NAMES: [&str; 0] = [];

    fn disk_roi(name: &str, grid: Grid, slices: &[usize], (ch, cw): (i64, i64), r2: i64) -> Roi {
        let mask = RoiMask::from_fn(grid, |(h, w)| {
            let (dh, dw) = (h as i64 - ch, w as i64 - cw);
            dh * dh + dw * dw <= r2
        });
        let mut roi = Roi::new(name, grid);
        for &k in slices {
            roi.set_slice_mask(k, &mask);
        }
        roi
    }

    fn masks(d: &DerivedRoi) -> BTreeMap<usize, RoiMask> {
        d.slices()
            .iter()
            .map(|(k, o)| {
                let m = match o {
                    Outcome::Produced(cs) => cs.rasterize(d.grid()),
                    Outcome::Empty => RoiMask::new(d.grid()),
                };
                (*k, m)
            })
            .collect()
    }

    fn run(op: RoiOperation) -> DerivedRoi {
        apply(&op, "OUT", &NO_NAMES).unwrap()
    }

    #[test]
    fn test_expand_contains_and_contract_within() {
        let grid = Grid::new(48, 48);
        let mut a = disk_roi("A", grid, &[3], (20, 24), 90);
        let two = disk_roi("x", grid, &[0], (20, 24), 90)
            .mask_at(0)
            .union(&disk_roi("y", grid, &[0], (36, 10), 40).mask_at(0))
            .unwrap();
        a.set_slice_mask(4, &two);
        for m in [0, 1, 3, 7] {
            let e = run(RoiOperation::Expand {
                roi: a.clone(),
                margin: m,
            });
            let c = run(RoiOperation::Contract {
                roi: a.clone(),
                margin: m,
            });
            for (k, mask) in masks(&e) {
                assert!(a.mask_at(k).is_subset_of(&mask));
            }
            for (k, mask) in masks(&c) {
                assert!(mask.is_subset_of(&a.mask_at(k)));
            }
        }
    }

    #[test]
    fn test_contract_to_nothing_is_empty() {
        let grid = Grid::new(32, 32);
        let a = disk_roi("A", grid, &[0, 1], (16, 16), 9);
        let d = run(RoiOperation::with_margin(a, Margin(-4)));
        assert_eq!(d.slices().len(), 2);
        assert!(d.is_empty());
        assert!(d.produced_slices().is_empty());
    }

    #[test]
    fn test_union_intersection_laws() {
        let grid = Grid::new(40, 40);
        let a = disk_roi("A", grid, &[1, 2], (15, 15), 50);
        let b = disk_roi("B", grid, &[2, 3], (20, 22), 60);

        let ab = run(RoiOperation::Union(a.clone(), b.clone()));
        let ba = run(RoiOperation::Union(b.clone(), a.clone()));
        assert_eq!(masks(&ab), masks(&ba));
        assert_eq!(ab.slices().keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);

        let iab = run(RoiOperation::Intersection(a.clone(), b.clone()));
        let iba = run(RoiOperation::Intersection(b.clone(), a.clone()));
        assert_eq!(masks(&iab), masks(&iba));
        assert!(iab.slices()[&1].is_empty());
        assert!(iab.slices()[&2].is_produced());

        let aa = run(RoiOperation::Union(a.clone(), a.clone()));
        let ia = run(RoiOperation::Intersection(a.clone(), a.clone()));
        for (k, cs) in a.slices() {
            assert_eq!(aa.slices()[k], Outcome::Produced(cs.clone()));
            assert_eq!(ia.slices()[k], Outcome::Produced(cs.clone()));
        }
    }

    #[test]
    fn test_difference() {
        let grid = Grid::new(40, 40);
        let a = disk_roi("A", grid, &[0], (15, 15), 50);
        let b = disk_roi("B", grid, &[0], (20, 22), 60);

        let ab = run(RoiOperation::Difference(a.clone(), b.clone()));
        let ba = run(RoiOperation::Difference(b.clone(), a.clone()));
        assert_ne!(masks(&ab), masks(&ba));

        let aa = run(RoiOperation::Difference(a.clone(), a));
        assert!(aa.slices().values().all(Outcome::is_empty));
    }

    #[test]
    fn test_rinds() {
        let grid = Grid::new(64, 64);
        let a = disk_roi("A", grid, &[5], (32, 32), 144);
        let radii = RindRadii::new(2, 5).unwrap();

        let inner = run(RoiOperation::InnerRind {
            roi: a.clone(),
            radii,
        });
        let inner_mask = &masks(&inner)[&5];
        assert!(inner_mask.is_subset_of(&a.mask_at(5)));
        assert!(!inner_mask.is_foreground_at((32, 32).into()));
        assert!(!inner_mask.is_foreground_at((32, 20).into()));
        assert!(inner_mask.is_foreground_at((32, 23).into()));

        let outer = run(RoiOperation::OuterRind { roi: a.clone(), radii });
        let outer_mask = &masks(&outer)[&5];
        assert!(outer_mask.intersection(&a.mask_at(5)).unwrap().is_empty());
        assert!(outer_mask.is_foreground_at((32, 17).into()));
        assert!(!outer_mask.is_foreground_at((32, 19).into()));
    }

    #[test]
    fn test_invalid_margin() {
        assert_eq!(
            RindRadii::new(3, 3),
            Err(RoiError::InvalidMargin { inner: 3, outer: 3 })
        );
        assert!(RindRadii::new(4, 1).is_err());
    }

    #[test]
    fn test_grid_mismatch() {
        let a = disk_roi("A", Grid::new(16, 16), &[0], (8, 8), 9);
        let b = disk_roi("B", Grid::new(16, 20), &[0], (8, 8), 9);
        assert!(matches!(
            apply(&RoiOperation::Union(a, b), "C", &NO_NAMES),
            Err(RoiError::GeometryMismatch { .. })
        ));
    }

    #[test]
    fn test_name_collision_is_flagged_not_blocked() {
        let grid = Grid::new(16, 16);
        let a = disk_roi("A", grid, &[0], (8, 8), 9);
        let op = RoiOperation::with_margin(a, Margin(1));
        let d = apply(&op, "PTV", &["GTV", "PTV"]).unwrap();
        assert!(d.name_collision());
        assert!(!d.is_empty());
        let d = apply(&op, "ptv", &["GTV", "PTV"]).unwrap();
        assert!(!d.name_collision());
        assert_eq!(d.into_roi().name(), "ptv");
    }
}
