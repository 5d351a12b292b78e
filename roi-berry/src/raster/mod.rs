//! 栅格工具: DDA 直线栅格化, 越界裁剪, 多边形填充与边界追踪.

mod polygon;
mod trace;

pub use polygon::{fill_contours, fill_stroke, point_in_polygon, signed_area2, VertexFrame};
pub use trace::trace_boundaries;

use crate::data::point::{Grid, Point2d};
use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 线段栅格化得到的有序像素路径. 可以由端点重新生成, 因此不需要持久化.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolylinePath {
    points: Vec<Point2d>,
}

impl PolylinePath {
    /// 所有路径点.
    #[inline]
    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// 路径点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否没有任何点 (只可能在裁剪之后出现).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 起点.
    #[inline]
    pub fn first(&self) -> Option<Point2d> {
        self.points.first().copied()
    }

    /// 终点.
    #[inline]
    pub fn last(&self) -> Option<Point2d> {
        self.points.last().copied()
    }

    /// 迭代路径点.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Point2d> + '_ {
        self.points.iter().copied()
    }

    /// 取出底层数据.
    #[inline]
    pub fn into_points(self) -> Vec<Point2d> {
        self.points
    }
}

impl FromIterator<Point2d> for PolylinePath {
    fn from_iter<T: IntoIterator<Item = Point2d>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// 浮点坐标舍入到最近的像素坐标, 恰好居中时取偶数.
#[inline]
fn round_to_pixel(v: f64) -> i32 {
    // 超出 `i32` 的坐标饱和, 之后会被网格裁掉.
    v.round_ties_even() as i32
}

/// DDA 的步数 `max(|dx|, |dy|)` 与每步增量.
fn dda_steps(p1: Point2d, p2: Point2d) -> (i64, f64, f64) {
    let dx = i64::from(p2.x) - i64::from(p1.x);
    let dy = i64::from(p2.y) - i64::from(p1.y);
    let length = dx.abs().max(dy.abs());
    if length == 0 {
        return (0, 0.0, 0.0);
    }
    (length, dx as f64 / length as f64, dy as f64 / length as f64)
}

/// 从第 `steps.start()` 步起逐步累加坐标.
fn walk(
    p1: Point2d,
    (step_x, step_y): (f64, f64),
    steps: RangeInclusive<i64>,
) -> impl Iterator<Item = Point2d> {
    let (x0, y0) = p1.to_f64();
    let first = *steps.start() as f64;
    let (mut x, mut y) = (x0 + first * step_x, y0 + first * step_y);
    steps.map(move |_| {
        let p = Point2d::new(round_to_pixel(x), round_to_pixel(y));
        x += step_x;
        y += step_y;
        p
    })
}

/// 单个坐标轴上可能舍入到 `[0, extent)` 内的步数区间.
fn step_range(origin: f64, step: f64, extent: usize, length: i64) -> Option<(i64, i64)> {
    let (lo, hi) = (-1.0, extent as f64);
    if step == 0.0 {
        return (lo..=hi).contains(&origin).then_some((0, length));
    }
    let (a, b) = ((lo - origin) / step, (hi - origin) / step);
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let first = a.ceil().max(0.0);
    let last = b.floor().min(length as f64);
    (first <= last).then_some((first as i64, last as i64))
}

/// DDA 直线栅格化.
///
/// 步数 `length = max(|dx|, |dy|)`, 每步前进 `(dx / length, dy / length)`,
/// 并把累积坐标舍入到最近的像素 (恰好居中时取偶数). 返回的路径以 `p1` 开头, 共
/// `length + 1` 个点, 最后一个点就是 `p2`. `p1 == p2` 时返回单点路径.
///
/// # 注意
///
/// 路径长度正比于端点跨度. 端点可能远在图像外时应使用 [`rasterize_line_within`].
pub fn rasterize_line(p1: Point2d, p2: Point2d) -> PolylinePath {
    let (length, step_x, step_y) = dda_steps(p1, p2);
    walk(p1, (step_x, step_y), 0..=length).collect()
}

/// 与 `clip_path(&rasterize_line(p1, p2), grid)` 相同, 但只遍历可能落在 `grid` 内的那段步数.
///
/// 开销只取决于网格大小, 与端点有多远无关. 起点在网格外时, 首个遍历点的坐标由乘法
/// 直接算出而非逐步累加.
pub fn rasterize_line_within(p1: Point2d, p2: Point2d, grid: Grid) -> PolylinePath {
    let (length, step_x, step_y) = dda_steps(p1, p2);
    let (x0, y0) = p1.to_f64();
    let steps = step_range(x0, step_x, grid.width(), length)
        .zip(step_range(y0, step_y, grid.height(), length))
        .map(|((a, b), (c, d))| a.max(c)..=b.min(d));
    match steps {
        Some(steps) if !steps.is_empty() => walk(p1, (step_x, step_y), steps)
            .filter(|p| grid.contains(*p))
            .collect(),
        _ => PolylinePath::default(),
    }
}

/// 只保留落在 `grid` 内的点, 保持原有顺序.
pub fn clip_path(path: &PolylinePath, grid: Grid) -> PolylinePath {
    path.iter().filter(|p| grid.contains(*p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(v: &[(i32, i32)]) -> Vec<Point2d> {
        v.iter().copied().map(Point2d::from).collect()
    }

    #[test]
    fn test_horizontal_line() {
        let path = rasterize_line(Point2d::new(0, 0), Point2d::new(3, 0));
        assert_eq!(path.points(), pts(&[(0, 0), (1, 0), (2, 0), (3, 0)]).as_slice());
    }

    #[test]
    fn test_zero_length_line() {
        let p = Point2d::new(5, 7);
        let path = rasterize_line(p, p);
        assert_eq!(path.points(), &[p]);
    }

    #[test]
    fn test_length_and_endpoints() {
        let cases = [
            ((0, 0), (7, 3)),
            ((10, 2), (-4, 9)),
            ((3, 3), (3, -8)),
            ((-5, -5), (5, 5)),
            ((100, 40), (1, 511)),
        ];
        for ((x1, y1), (x2, y2)) in cases {
            let (p1, p2) = (Point2d::new(x1, y1), Point2d::new(x2, y2));
            let path = rasterize_line(p1, p2);
            let expect = (x2 - x1).abs().max((y2 - y1).abs()) as usize + 1;
            assert_eq!(path.len(), expect);
            assert_eq!(path.first(), Some(p1));
            assert_eq!(path.last(), Some(p2));
            // 8-连通: 相邻两点在每个方向上最多相差 1.
            for w in path.points().windows(2) {
                assert!((w[0].x - w[1].x).abs() <= 1 && (w[0].y - w[1].y).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_rounding_ties_to_even() {
        // 第一步 y = 0.5.
        let path = rasterize_line(Point2d::new(0, 0), Point2d::new(2, 1));
        assert_eq!(path.points(), pts(&[(0, 0), (1, 0), (2, 1)]).as_slice());
        let path = rasterize_line(Point2d::new(0, 0), Point2d::new(2, -1));
        assert_eq!(path.points(), pts(&[(0, 0), (1, 0), (2, -1)]).as_slice());

        // y = 0.5, 1.0, 1.5, 2.0, 2.5, 3.0.
        let path = rasterize_line(Point2d::new(0, 0), Point2d::new(6, 3));
        let ys: Vec<i32> = path.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0, 0, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn test_clip_path() {
        let path = rasterize_line(Point2d::new(-2, 0), Point2d::new(2, 0));
        let clipped = clip_path(&path, Grid::new(4, 4));
        assert_eq!(clipped.points(), pts(&[(0, 0), (1, 0), (2, 0)]).as_slice());
        let outside = rasterize_line(Point2d::new(-5, -1), Point2d::new(-1, -1));
        assert!(clip_path(&outside, Grid::new(4, 4)).is_empty());
    }

    #[test]
    fn test_within_matches_clipped_line() {
        let grid = Grid::new(8, 8);
        let cases = [
            ((0, 0), (7, 3)),
            ((-2, 1), (5, 1)),
            ((10, 2), (-4, 9)),
            ((-3, -3), (13, 5)),
            ((3, 3), (3, -8)),
            ((6, 3), (0, 0)),
            ((4, 4), (4, 4)),
            ((-5, -1), (-1, -1)),
        ];
        for ((x1, y1), (x2, y2)) in cases {
            let (p1, p2) = (Point2d::new(x1, y1), Point2d::new(x2, y2));
            assert_eq!(
                rasterize_line_within(p1, p2, grid),
                clip_path(&rasterize_line(p1, p2), grid),
                "{p1:?} -> {p2:?}"
            );
        }
    }

    #[test]
    fn test_within_far_endpoints() {
        let grid = Grid::standard();
        let path = rasterize_line_within(Point2d::new(0, 0), Point2d::new(i32::MAX, 0), grid);
        assert_eq!(path.len(), 512);
        assert_eq!(path.first(), Some(Point2d::new(0, 0)));
        assert_eq!(path.last(), Some(Point2d::new(511, 0)));

        let small = Grid::new(16, 16);
        let path = rasterize_line_within(
            Point2d::new(-2_000_000_000, 5),
            Point2d::new(2_000_000_000, 5),
            small,
        );
        assert_eq!(path.points(), (0..16).map(|x| Point2d::new(x, 5)).collect::<Vec<_>>());

        let path = rasterize_line_within(
            Point2d::new(i32::MIN, i32::MIN),
            Point2d::new(i32::MAX, i32::MAX),
            small,
        );
        assert_eq!(path.points(), (0..16).map(|i| Point2d::new(i, i)).collect::<Vec<_>>());

        let miss =
            rasterize_line_within(Point2d::new(i32::MIN, -7), Point2d::new(i32::MAX, -7), small);
        assert!(miss.is_empty());
    }
}
