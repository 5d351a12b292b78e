//! 合成体模. 消融实验不依赖真实病人数据.

use roi_berry::prelude::*;

/// 以 `(ch, cw)` 为圆心, 半径平方不超过 `r2` 的圆盘.
pub fn disk(grid: Grid, (ch, cw): (f64, f64), r2: f64) -> RoiMask {
    RoiMask::from_fn(grid, |(h, w)| {
        let (dh, dw) = (h as f64 - ch, w as f64 - cw);
        dh * dh + dw * dw <= r2
    })
}

/// 近似椭球的 ROI: 在 `num_slices` 张切片上, 圆盘半径从两端向中间增大到 `radius`.
///
/// 圆心在切片之间沿 `drift` 方向平移, 使不同切片的形状不完全相同.
pub fn ellipsoid(
    name: &str,
    grid: Grid,
    num_slices: usize,
    center: (f64, f64),
    radius: f64,
    drift: (f64, f64),
) -> Roi {
    let mut roi = Roi::new(name, grid);
    let half = num_slices as f64 / 2.0;
    for k in 0..num_slices {
        let t = (k as f64 + 0.5 - half) / half;
        let r2 = radius * radius * (1.0 - t * t);
        if r2 <= 0.0 {
            continue;
        }
        let c = (center.0 + drift.0 * k as f64, center.1 + drift.1 * k as f64);
        roi.set_slice_mask(k, &disk(grid, c, r2));
    }
    roi
}

/// 两个部分重叠的椭球体模, 分别作为二元运算的左右操作数.
pub fn overlapping_pair(grid: Grid, num_slices: usize) -> (Roi, Roi) {
    let (h, w) = (grid.height() as f64, grid.width() as f64);
    let a = ellipsoid(
        "GTV",
        grid,
        num_slices,
        (h * 0.45, w * 0.42),
        h * 0.18,
        (0.3, 0.1),
    );
    let b = ellipsoid(
        "OAR",
        grid,
        num_slices,
        (h * 0.55, w * 0.58),
        h * 0.15,
        (-0.2, 0.2),
    );
    (a, b)
}

/// 由若干带空洞和细颈的圆盘组成的画笔选区, 用于测量描绘后处理.
pub fn brush_selection(grid: Grid, seed: usize) -> Vec<Point2d> {
    let (h, w) = (grid.height() as f64, grid.width() as f64);
    let shift = (seed % 17) as f64;
    let left = disk(grid, (h * 0.5, w * 0.3 + shift), (h * 0.12).powi(2));
    let right = disk(grid, (h * 0.5 + shift, w * 0.7), (h * 0.1).powi(2));
    let hole = disk(grid, (h * 0.5, w * 0.3 + shift), 2.0);
    let mut pixels = Vec::new();
    for ((ph, pw), &v) in left.indexed_iter() {
        let neck = (ph as f64 - h * 0.5).abs() < 1.5 && (pw as f64) > w * 0.3;
        let inside = v == MASK_FOREGROUND || right[(ph, pw)] == MASK_FOREGROUND || neck;
        if inside && hole[(ph, pw)] == MASK_BACKGROUND {
            if let Some(p) = Point2d::from_idx((ph, pw)) {
                pixels.push(p);
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_overlaps() {
        let grid = Grid::new(128, 128);
        let (a, b) = overlapping_pair(grid, 10);
        assert_eq!(a.slices().len(), 10);
        let k = 5;
        let inter = a.mask_at(k).intersection(&b.mask_at(k)).unwrap();
        assert!(!inter.is_empty());
    }

    #[test]
    fn test_brush_selection_in_bounds() {
        let grid = Grid::new(96, 96);
        let px = brush_selection(grid, 3);
        assert!(!px.is_empty());
        assert!(px.iter().all(|p| grid.contains(*p)));
    }
}
