use super::rasterize_line_within;
use crate::consts::gray::MASK_FOREGROUND;
use crate::data::mask::RoiMask;
use crate::data::point::{Grid, Point2d};
use ordered_float::OrderedFloat;

/// 多边形顶点坐标的含义.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VertexFrame {
    /// 顶点 `(x, y)` 是像素 `(x, y)` 的左上角. 引擎产生的轮廓都使用该坐标.
    Corner,

    /// 顶点 `(x, y)` 是像素 `(x, y)` 的中心. 手绘笔画使用该坐标.
    Centre,
}

impl VertexFrame {
    /// 顶点到 "角点坐标" 的偏移.
    #[inline]
    fn offset(self) -> f64 {
        match self {
            Self::Corner => 0.0,
            Self::Centre => 0.5,
        }
    }
}

/// 鞋带公式计算闭合多边形的有向面积的两倍.
///
/// 在屏幕坐标 (y 轴向下) 中, 顺时针多边形的结果为正. 任意 `i32` 顶点都不会溢出.
pub fn signed_area2(points: &[Point2d]) -> i128 {
    if points.len() < 3 {
        return 0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i128::from(a.x) * i128::from(b.y) - i128::from(b.x) * i128::from(a.y))
        .sum()
}

/// 射线法判断点 `(x, y)` 是否在多边形 `poly` 内 (奇偶规则).
pub fn point_in_polygon((x, y): (f64, f64), poly: &[(f64, f64)]) -> bool {
    let mut inside = false;
    let Some(mut j) = poly.len().checked_sub(1) else {
        return false;
    };
    for i in 0..poly.len() {
        let (xi, yi) = poly[i];
        let (xj, yj) = poly[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// 以奇偶规则把若干闭合多边形扫描线填充到掩膜上: 像素中心 `(x + 0.5, y + 0.5)`
/// 落在内部的像素成为前景. 多边形之间不要求不相交, 外轮廓与空洞轮廓可以混在一起.
///
/// 边界上的像素中心采用左闭右开规则, 因此相邻多边形之间不会重复填充.
pub fn fill_contours<'a, I>(polygons: I, frame: VertexFrame, grid: Grid) -> RoiMask
where
    I: IntoIterator<Item = &'a [Point2d]>,
{
    let off = frame.offset();
    // 所有有效边, 以角点坐标表示.
    let edges: Vec<((f64, f64), (f64, f64))> = polygons
        .into_iter()
        .filter(|poly| poly.len() >= 3)
        .flat_map(|poly| {
            poly.iter().zip(poly.iter().cycle().skip(1)).map(move |(a, b)| {
                let (ax, ay) = a.to_f64();
                let (bx, by) = b.to_f64();
                ((ax + off, ay + off), (bx + off, by + off))
            })
        })
        .filter(|((_, ay), (_, by))| ay != by)
        .collect();

    let mut mask = RoiMask::new(grid);
    if edges.is_empty() {
        return mask;
    }

    let width = grid.width() as f64;
    let mut crossings: Vec<f64> = Vec::with_capacity(8);
    for h in 0..grid.height() {
        let yc = h as f64 + 0.5;
        crossings.clear();
        crossings.extend(edges.iter().filter_map(|&((ax, ay), (bx, by))| {
            ((ay > yc) != (by > yc)).then(|| ax + (yc - ay) * (bx - ax) / (by - ay))
        }));
        crossings.sort_unstable_by_key(|&x| OrderedFloat(x));

        for pair in crossings.chunks_exact(2) {
            // 中心 w + 0.5 落在 [left, right) 内.
            let start = (pair[0] - 0.5).ceil().clamp(0.0, width) as usize;
            let end = (pair[1] - 0.5).ceil().clamp(0.0, width) as usize;
            for w in start..end {
                mask[(h, w)] = MASK_FOREGROUND;
            }
        }
    }
    mask
}

/// 手绘闭合笔画的填充: 以像素中心为顶点的多边形内部, 并上笔画本身经过的像素
/// (包括首尾闭合段). 越界部分被裁掉.
pub fn fill_stroke(points: &[Point2d], grid: Grid) -> RoiMask {
    let mut mask = fill_contours([points], VertexFrame::Centre, grid);
    if points.is_empty() {
        return mask;
    }
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        for p in rasterize_line_within(*a, *b, grid).iter() {
            mask.set(p, MASK_FOREGROUND);
        }
    }
    mask
}
