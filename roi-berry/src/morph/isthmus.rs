use crate::consts::gray::*;
use crate::data::mask::{neighbour8, RoiMask};
use crate::Idx2d;
use ndarray::Array2;
use std::collections::{HashSet, VecDeque};

/// 以 `side × side` 的正方形做开运算: 所有完全落在前景内的正方形的并.
///
/// `side <= 1` 时开运算是恒等变换.
pub fn open_square(mask: &RoiMask, side: u32) -> RoiMask {
    let side = side as usize;
    if side <= 1 {
        return mask.clone();
    }
    let (h, w) = mask.shape();
    let mut out = RoiMask::new(mask.grid());
    if side > h || side > w {
        return out;
    }

    // 积分图: sum[(i, j)] 为 [0, i) × [0, j) 内的前景像素数.
    let mut sum = Array2::<u32>::zeros((h + 1, w + 1));
    for i in 0..h {
        for j in 0..w {
            let v = u32::from(is_foreground(mask[(i, j)]));
            sum[(i + 1, j + 1)] = v + sum[(i, j + 1)] + sum[(i + 1, j)] - sum[(i, j)];
        }
    }

    // 差分数组记录每个可放置的正方形, 再前缀求和得到覆盖次数.
    let full = (side * side) as u32;
    let mut diff = Array2::<i32>::zeros((h + 1, w + 1));
    for i in 0..=h - side {
        for j in 0..=w - side {
            let (i2, j2) = (i + side, j + side);
            if sum[(i2, j2)] + sum[(i, j)] - sum[(i, j2)] - sum[(i2, j)] == full {
                diff[(i, j)] += 1;
                diff[(i, j2)] -= 1;
                diff[(i2, j)] -= 1;
                diff[(i2, j2)] += 1;
            }
        }
    }
    for i in 0..=h {
        for j in 1..=w {
            diff[(i, j)] += diff[(i, j - 1)];
        }
    }
    for i in 1..=h {
        for j in 0..=w {
            diff[(i, j)] += diff[(i - 1, j)];
        }
    }
    for i in 0..h {
        for j in 0..w {
            if diff[(i, j)] > 0 {
                out[(i, j)] = MASK_FOREGROUND;
            }
        }
    }
    out
}

/// 按照 8-相邻规则统计 `points` 中的连通分组个数.
fn count_groups8(points: &HashSet<Idx2d>) -> usize {
    let mut seen = HashSet::with_capacity(points.len());
    let mut q = VecDeque::new();
    let mut groups = 0;
    for &p in points {
        if !seen.insert(p) {
            continue;
        }
        groups += 1;
        q.push_back(p);
        while let Some(cur) = q.pop_front() {
            for n in neighbour8(cur) {
                if points.contains(&n) && seen.insert(n) {
                    q.push_back(n);
                }
            }
        }
    }
    groups
}

/// 切断宽度小于 `width` 的细颈.
///
/// 先以 `width × width` 正方形开运算得到 "主体", 掩膜减去主体为 "残余".
/// 一个 4-连通的残余区域如果与主体的 4-相邻接触像素分成两个或更多 8-连通组,
/// 说明它连接了主体的不同部分, 是细颈, 将被移除. 其它残余 (突起, 锯齿边缘,
/// 整体都很细的形状) 保留.
///
/// 返回处理后的掩膜和被移除的像素数. `width <= 1` 时不做任何处理.
pub fn cut_isthmuses(mask: &RoiMask, width: u32) -> (RoiMask, usize) {
    if width <= 1 {
        return (mask.clone(), 0);
    }
    let mut labels = open_square(mask, width);
    for (pos, &v) in mask.indexed_iter() {
        if is_foreground(v) && is_background(labels[pos]) {
            labels[pos] = MASK_RESIDUE;
        }
    }

    let mut ans = mask.clone();
    let mut removed = 0;
    for area in labels.areas(is_residue) {
        let contact: HashSet<Idx2d> = area
            .iter()
            .flat_map(|p| labels.n4_positions(*p))
            .filter(|p| is_foreground(labels[*p]))
            .collect();
        if count_groups8(&contact) >= 2 {
            removed += area.len();
            ans.fill_batch(area, MASK_BACKGROUND);
        }
    }
    (ans, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::point::Grid;

    fn from_rows(rows: &[&str]) -> RoiMask {
        let grid = Grid::new(rows.len(), rows[0].len());
        RoiMask::from_fn(grid, |(h, w)| rows[h].as_bytes()[w] == b'1')
    }

    fn brute_open(mask: &RoiMask, side: usize) -> RoiMask {
        let (h, w) = mask.shape();
        let mut out = RoiMask::new(mask.grid());
        for i in 0..h.saturating_sub(side - 1) {
            for j in 0..w.saturating_sub(side - 1) {
                let square = || (i..i + side).flat_map(move |a| (j..j + side).map(move |b| (a, b)));
                if square().all(|p| is_foreground(mask[p])) {
                    out.fill_batch(square(), MASK_FOREGROUND);
                }
            }
        }
        out
    }

    /// 两个 10×8 的矩形由 `neck` 行高, 4 列长的细颈连接.
    fn dumbbell(neck: usize) -> RoiMask {
        RoiMask::from_fn(Grid::new(20, 26), |(h, w)| {
            let blob = (4..14).contains(&h) && ((2..10).contains(&w) || (14..22).contains(&w));
            let bridge = (8..8 + neck).contains(&h) && (10..14).contains(&w);
            blob || bridge
        })
    }

    #[test]
    fn test_open_square_matches_brute_force() {
        let m = from_rows(&[
            "0111100000",
            "0111111000",
            "0111111100",
            "1111011110",
            "0011111110",
            "0001111111",
            "0000001111",
        ]);
        for side in 1..=4 {
            assert_eq!(open_square(&m, side as u32), brute_open(&m, side));
        }
        assert!(open_square(&m, 11).is_empty());
    }

    #[test]
    fn test_neck_is_severed() {
        let m = dumbbell(3);
        assert_eq!(m.foreground_areas().len(), 1);
        let (cut, removed) = cut_isthmuses(&m, 5);
        assert_eq!(removed, 12);
        assert_eq!(cut.foreground_areas().len(), 2);
        assert!(cut.is_subset_of(&m));
    }

    #[test]
    fn test_wide_neck_is_kept() {
        let m = dumbbell(5);
        let (cut, removed) = cut_isthmuses(&m, 5);
        assert_eq!(removed, 0);
        assert_eq!(cut, m);
    }

    #[test]
    fn test_protrusion_and_thin_shapes_kept() {
        // 10×10 方块右侧带一个 2×3 的突起.
        let m = RoiMask::from_fn(Grid::new(16, 16), |(h, w)| {
            ((2..12).contains(&h) && (2..12).contains(&w))
                || ((6..8).contains(&h) && (12..15).contains(&w))
        });
        assert_eq!(cut_isthmuses(&m, 5), (m.clone(), 0));

        // 整体宽度只有 2 的 L 形.
        let thin = RoiMask::from_fn(Grid::new(16, 16), |(h, w)| {
            let arm = |a: usize, b: usize| (2..4).contains(&a) && (2..14).contains(&b);
            arm(h, w) || arm(w, h)
        });
        assert_eq!(cut_isthmuses(&thin, 5), (thin.clone(), 0));
    }

    #[test]
    fn test_width_one_disables() {
        let m = dumbbell(1);
        assert_eq!(cut_isthmuses(&m, 1), (m.clone(), 0));
        assert_eq!(cut_isthmuses(&m, 0), (m.clone(), 0));
    }
}
