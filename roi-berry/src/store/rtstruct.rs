//! RTSTRUCT 轮廓表示, 以及像素坐标与病人坐标 (mm) 之间的转换.

use crate::contour::{Contour, ContourSet};
use crate::data::point::{Grid, PixelSpacing, Point2d};
use crate::error::{RoiError, RoiResult};
use num::ToPrimitive;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 闭合平面轮廓的几何类型标记.
pub const CLOSED_PLANAR: &str = "CLOSED_PLANAR";

/// 单切片体数据允许的 z 偏差 (mm).
const LONE_SLICE_TOLERANCE: f64 = 0.5;

/// Structure Set ROI 序列中的一项.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructureSetRoi {
    /// ROI 编号.
    pub number: u32,
    /// ROI 名称.
    pub name: String,
    /// 生成算法, 如 `MANUAL`.
    pub generation_algorithm: String,
}

/// 一条轮廓: 几何类型与展平的 `x, y, z` 三元组 (mm).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ContourItem {
    /// 几何类型, 引擎只读写 [`CLOSED_PLANAR`].
    pub geometric_type: String,
    /// 展平的顶点坐标.
    pub data: Vec<f64>,
}

impl ContourItem {
    /// 顶点个数.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.data.len() / 3
    }
}

/// ROI Contour 序列中的一项.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoiContour {
    /// 引用的 ROI 编号.
    pub referenced_roi_number: u32,
    /// 所有切片上的轮廓.
    pub contours: Vec<ContourItem>,
}

/// 结构集的原生表示.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RtStruct {
    /// Structure Set ROI 序列.
    pub structure_set_rois: Vec<StructureSetRoi>,
    /// ROI Contour 序列.
    pub roi_contours: Vec<RoiContour>,
}

impl RtStruct {
    /// 按名称查找 (区分大小写).
    pub fn roi_by_name(&self, name: &str) -> Option<&StructureSetRoi> {
        self.structure_set_rois.iter().find(|r| r.name == name)
    }

    /// 新 ROI 应使用的编号: 现有最大编号加一.
    ///
    /// 最大编号已是 `u32::MAX` 时返回 `RoiError::RoiNumbersExhausted`.
    pub fn next_roi_number(&self) -> RoiResult<u32> {
        match self.structure_set_rois.iter().map(|r| r.number).max() {
            None => Ok(1),
            Some(n) => n.checked_add(1).ok_or(RoiError::RoiNumbersExhausted),
        }
    }

    /// 某编号 ROI 的所有轮廓. 没有 ROI Contour 项时为空.
    pub fn contours_of(&self, number: u32) -> &[ContourItem] {
        self.roi_contours
            .iter()
            .find(|c| c.referenced_roi_number == number)
            .map(|c| c.contours.as_slice())
            .unwrap_or_default()
    }

    /// 以 `contours` 整体替换某编号 ROI 的轮廓, 必要时新建 ROI Contour 项.
    pub(crate) fn replace_contours(&mut self, number: u32, contours: Vec<ContourItem>) {
        match self
            .roi_contours
            .iter_mut()
            .find(|c| c.referenced_roi_number == number)
        {
            Some(c) => c.contours = contours,
            None => self.roi_contours.push(RoiContour {
                referenced_roi_number: number,
                contours,
            }),
        }
    }
}

/// 构造 [`VolumeGeometry`] 时的错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitGeometryError {
    /// 没有任何切片.
    NoSlices,
    /// 切片位置不是有限值.
    NonFinitePosition,
    /// 两张切片位于同一平面.
    DuplicateSlicePosition,
}

/// 体数据几何: 网格, 像素间距与每张切片的 Image Position (Patient).
///
/// Image Position 是像素 `(0, 0)` **中心** 的病人坐标, 而轮廓顶点位于像素角点,
/// 因此角点 `(x, y)` 对应 `X = ox + (x - 0.5)·col_mm`, `Y = oy + (y - 0.5)·row_mm`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeGeometry {
    grid: Grid,
    spacing: PixelSpacing,
    positions: Vec<[f64; 3]>,
    tolerance: f64,
}

impl VolumeGeometry {
    /// 由每张切片的位置构造. 切片编号即 `positions` 的下标.
    pub fn new(
        grid: Grid,
        spacing: PixelSpacing,
        positions: Vec<[f64; 3]>,
    ) -> Result<Self, InitGeometryError> {
        if positions.is_empty() {
            return Err(InitGeometryError::NoSlices);
        }
        if positions.iter().flatten().any(|v| !v.is_finite()) {
            return Err(InitGeometryError::NonFinitePosition);
        }
        let mut z: Vec<f64> = positions.iter().map(|p| p[2]).collect();
        z.sort_by(f64::total_cmp);
        let min_gap = z
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);
        if min_gap <= 0.0 {
            return Err(InitGeometryError::DuplicateSlicePosition);
        }
        let tolerance = if min_gap.is_finite() {
            min_gap / 2.0
        } else {
            LONE_SLICE_TOLERANCE
        };
        Ok(Self {
            grid,
            spacing,
            positions,
            tolerance,
        })
    }

    /// 等间距的轴向体数据: 第 `k` 张切片位于 `origin + k·thickness` (只沿 z).
    pub fn uniform(
        grid: Grid,
        spacing: PixelSpacing,
        origin: [f64; 3],
        thickness: f64,
        num_slices: usize,
    ) -> Result<Self, InitGeometryError> {
        let [ox, oy, oz] = origin;
        let positions = (0..num_slices)
            .map(|k| [ox, oy, oz + k as f64 * thickness])
            .collect();
        Self::new(grid, spacing, positions)
    }

    /// 网格.
    #[inline]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// 像素间距.
    #[inline]
    pub fn spacing(&self) -> PixelSpacing {
        self.spacing
    }

    /// 切片数.
    #[inline]
    pub fn num_slices(&self) -> usize {
        self.positions.len()
    }

    /// 检查切片编号.
    #[inline]
    pub fn check_slice(&self, slice: usize) -> RoiResult<()> {
        if slice < self.positions.len() {
            Ok(())
        } else {
            Err(RoiError::UnknownSlice(slice))
        }
    }

    /// 切片 `slice` 上的角点 `p` 对应的病人坐标.
    pub fn to_patient(&self, p: Point2d, slice: usize) -> RoiResult<[f64; 3]> {
        self.check_slice(slice)?;
        let [ox, oy, oz] = self.positions[slice];
        let (x, y) = p.to_f64();
        Ok([
            ox + (x - 0.5) * self.spacing.col_mm(),
            oy + (y - 0.5) * self.spacing.row_mm(),
            oz,
        ])
    }

    /// 与 `z` 最近且相差不超过半个层间距的切片.
    pub fn slice_at(&self, z: f64) -> Option<usize> {
        self.positions
            .iter()
            .map(|p| (p[2] - z).abs())
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .filter(|(_, d)| *d <= self.tolerance)
            .map(|(k, _)| k)
    }

    /// 病人坐标 -> (切片, 最近的角点).
    pub fn to_pixel(&self, [px, py, pz]: [f64; 3]) -> RoiResult<(usize, Point2d)> {
        let slice = self
            .slice_at(pz)
            .ok_or(RoiError::InvalidGeometry("contour plane matches no slice"))?;
        let [ox, oy, _] = self.positions[slice];
        let corner = |v: f64| {
            v.round()
                .to_i32()
                .ok_or(RoiError::InvalidGeometry("contour vertex out of range"))
        };
        let x = corner((px - ox) / self.spacing.col_mm() + 0.5)?;
        let y = corner((py - oy) / self.spacing.row_mm() + 0.5)?;
        Ok((slice, Point2d::new(x, y)))
    }

    /// 把逐切片轮廓编码为 `CLOSED_PLANAR` 轮廓项.
    pub fn encode(&self, slices: &BTreeMap<usize, ContourSet>) -> RoiResult<Vec<ContourItem>> {
        let mut items = Vec::new();
        for (&k, cs) in slices {
            for contour in cs {
                let mut data = Vec::with_capacity(contour.len() * 3);
                for &p in contour.points() {
                    data.extend(self.to_patient(p, k)?);
                }
                items.push(ContourItem {
                    geometric_type: CLOSED_PLANAR.to_string(),
                    data,
                });
            }
        }
        Ok(items)
    }

    /// 把轮廓项解码为逐切片轮廓. 非 `CLOSED_PLANAR` 的项被跳过.
    ///
    /// 一条轮廓的切片由它的第一个顶点决定.
    pub fn decode(&self, items: &[ContourItem]) -> RoiResult<BTreeMap<usize, ContourSet>> {
        let mut slices: BTreeMap<usize, ContourSet> = BTreeMap::new();
        for item in items {
            if item.geometric_type != CLOSED_PLANAR {
                log::debug!("skip {} contour item", item.geometric_type);
                continue;
            }
            if item.data.len() % 3 != 0 {
                return Err(RoiError::InvalidGeometry("contour data is not xyz triples"));
            }
            let mut slice = None;
            let mut points = Vec::with_capacity(item.num_points());
            for xyz in item.data.chunks_exact(3) {
                let (k, p) = self.to_pixel([xyz[0], xyz[1], xyz[2]])?;
                slice.get_or_insert(k);
                points.push(p);
            }
            if let Some(k) = slice {
                slices.entry(k).or_default().push(Contour::new(points));
            }
        }
        Ok(slices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mask::RoiMask;

    fn geometry() -> VolumeGeometry {
        let spacing = PixelSpacing::new(0.976_562_5, 0.976_562_5).unwrap();
        VolumeGeometry::uniform(Grid::standard(), spacing, [-249.5, -180.25, -60.0], 2.5, 40)
            .unwrap()
    }

    #[test]
    fn test_geometry_errors() {
        let (g, s) = (Grid::new(4, 4), PixelSpacing::unit());
        assert_eq!(
            VolumeGeometry::new(g, s, vec![]),
            Err(InitGeometryError::NoSlices)
        );
        assert_eq!(
            VolumeGeometry::new(g, s, vec![[0.0, 0.0, f64::NAN]]),
            Err(InitGeometryError::NonFinitePosition)
        );
        assert_eq!(
            VolumeGeometry::new(g, s, vec![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
            Err(InitGeometryError::DuplicateSlicePosition)
        );
    }

    #[test]
    fn test_corner_mapping() {
        let g = geometry();
        let [x, y, z] = g.to_patient(Point2d::new(0, 0), 0).unwrap();
        assert_eq!(x, -249.5 - 0.976_562_5 / 2.0);
        assert_eq!(y, -180.25 - 0.976_562_5 / 2.0);
        assert_eq!(z, -60.0);
        assert_eq!(g.to_pixel([x, y, z]).unwrap(), (0, Point2d::new(0, 0)));

        let p = Point2d::new(200, 311);
        let xyz = g.to_patient(p, 17).unwrap();
        assert_eq!(g.to_pixel(xyz).unwrap(), (17, p));
        assert!(matches!(
            g.to_patient(p, 40),
            Err(RoiError::UnknownSlice(40))
        ));
    }

    #[test]
    fn test_slice_resolution() {
        let g = geometry();
        assert_eq!(g.slice_at(-60.0), Some(0));
        assert_eq!(g.slice_at(-58.9), Some(0));
        assert_eq!(g.slice_at(-58.6), Some(1));
        assert_eq!(g.slice_at(-61.25), Some(0));
        assert_eq!(g.slice_at(-61.5), None);
        assert_eq!(g.slice_at(40.0), None);

        let lone = VolumeGeometry::new(
            Grid::new(4, 4),
            PixelSpacing::unit(),
            vec![[0.0, 0.0, 3.0]],
        )
        .unwrap();
        assert_eq!(lone.slice_at(3.4), Some(0));
        assert_eq!(lone.slice_at(3.6), None);
    }

    #[test]
    fn test_encode_decode_lossless() {
        let g = geometry();
        let mask = RoiMask::from_fn(g.grid(), |(h, w)| {
            let (dh, dw) = (h as i64 - 250, w as i64 - 260);
            (100..=900).contains(&(dh * dh + dw * dw))
        });
        let slices: BTreeMap<usize, ContourSet> = [
            (3, ContourSet::from_mask(&mask)),
            (39, ContourSet::from_mask(&mask)),
        ]
        .into();
        let items = g.encode(&slices).unwrap();
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i.geometric_type == CLOSED_PLANAR));
        assert_eq!(g.decode(&items).unwrap(), slices);

        let bad = ContourItem {
            geometric_type: CLOSED_PLANAR.to_string(),
            data: vec![0.0; 4],
        };
        assert!(g.decode(&[bad]).is_err());

        let point = ContourItem {
            geometric_type: "POINT".to_string(),
            data: vec![0.0; 3],
        };
        assert!(g.decode(&[point]).unwrap().is_empty());
    }

    #[test]
    fn test_roi_numbers() {
        let mut rt = RtStruct::default();
        assert_eq!(rt.next_roi_number(), Ok(1));
        for (number, name) in [(3, "GTV"), (7, "PTV")] {
            rt.structure_set_rois.push(StructureSetRoi {
                number,
                name: name.to_string(),
                generation_algorithm: "MANUAL".to_string(),
            });
        }
        assert_eq!(rt.next_roi_number(), Ok(8));
        assert_eq!(rt.roi_by_name("PTV").map(|r| r.number), Some(7));
        assert!(rt.roi_by_name("ptv").is_none());
        assert!(rt.contours_of(3).is_empty());

        rt.replace_contours(3, vec![]);
        rt.replace_contours(3, vec![]);
        assert_eq!(rt.roi_contours.len(), 1);

        rt.structure_set_rois.push(StructureSetRoi {
            number: u32::MAX,
            name: "LAST".to_string(),
            generation_algorithm: "MANUAL".to_string(),
        });
        assert_eq!(rt.next_roi_number(), Err(RoiError::RoiNumbersExhausted));
    }
}
