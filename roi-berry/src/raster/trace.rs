use crate::consts::gray::is_foreground;
use crate::data::mask::RoiMask;
use crate::data::point::Point2d;
use ndarray::Array2;

/// 裂缝边的行进方向. 顺序即屏幕坐标下的顺时针顺序.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Dir {
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

const DIRS: [Dir; 4] = [Dir::East, Dir::South, Dir::West, Dir::North];

impl Dir {
    #[inline]
    fn delta(self) -> (usize, usize, bool) {
        // (dh, dw, 是否为负方向)
        match self {
            Dir::East => (0, 1, false),
            Dir::South => (1, 0, false),
            Dir::West => (0, 1, true),
            Dir::North => (1, 0, true),
        }
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << self as u8
    }

    #[inline]
    fn right(self) -> Self {
        DIRS[(self as usize + 1) % 4]
    }

    #[inline]
    fn left(self) -> Self {
        DIRS[(self as usize + 3) % 4]
    }

    /// 从顶点 `(h, w)` 沿该方向走一步. 调用者保证不会越出顶点网格.
    #[inline]
    fn step(self, (h, w): (usize, usize)) -> (usize, usize) {
        let (dh, dw, neg) = self.delta();
        if neg {
            (h - dh, w - dw)
        } else {
            (h + dh, w + dw)
        }
    }
}

/// 所有有向裂缝边, 按起点顶点存放为方向位图. 顶点网格为 `(H + 1) × (W + 1)`.
fn crack_edges(mask: &RoiMask) -> Array2<u8> {
    let (height, width) = mask.shape();
    let mut out = Array2::<u8>::zeros((height + 1, width + 1));
    let fg = |h: usize, w: usize| mask.get((h, w)).is_some_and(|&v| is_foreground(v));

    for ((h, w), &v) in mask.indexed_iter() {
        if !is_foreground(v) {
            continue;
        }
        // 前景始终位于行进方向的右侧.
        if h == 0 || !fg(h - 1, w) {
            out[(h, w)] |= Dir::East.bit();
        }
        if !fg(h, w + 1) {
            out[(h, w + 1)] |= Dir::South.bit();
        }
        if !fg(h + 1, w) {
            out[(h + 1, w + 1)] |= Dir::West.bit();
        }
        if w == 0 || !fg(h, w - 1) {
            out[(h + 1, w)] |= Dir::North.bit();
        }
    }
    out
}

/// 把掩膜的前景边界追踪为裂缝多边形. 顶点 `(x, y)` 为像素 `(x, y)` 的左上角.
///
/// 外边界在屏幕上顺时针, 空洞边界逆时针. 在鞍点 (两个前景像素仅对角相接)
/// 处总是取最右转向, 因此对角相接的像素属于不同的多边形. 共线的中间顶点被合并.
/// 输出按起点的行优先顺序排列, 对同一掩膜总是相同.
pub fn trace_boundaries(mask: &RoiMask) -> Vec<Vec<Point2d>> {
    let mut edges = crack_edges(mask);
    let mut ans = Vec::new();

    let starts: Vec<(usize, usize)> = edges
        .indexed_iter()
        .filter_map(|(pos, &bits)| (bits != 0).then_some(pos))
        .collect();

    for start in starts {
        while edges[start] != 0 {
            // 剩余边中行优先最靠前的顶点, 其出边只可能是东或南.
            let start_dir = if edges[start] & Dir::East.bit() != 0 {
                Dir::East
            } else {
                Dir::South
            };
            if let Some(poly) = follow(&mut edges, start, start_dir) {
                ans.push(poly);
            }
        }
    }
    ans
}

/// 从 `start` 出发沿 `start_dir` 走完一个闭合环, 并消耗经过的边.
fn follow(edges: &mut Array2<u8>, start: (usize, usize), start_dir: Dir) -> Option<Vec<Point2d>> {
    let mut poly = vec![vertex(start)?];
    let mut cur = start;
    let mut dir = start_dir;

    loop {
        edges[cur] &= !dir.bit();
        cur = dir.step(cur);

        // 右转优先, 其次直行, 最后左转. 回到起点且将要走起始边时闭合.
        let next = [dir.right(), dir, dir.left()]
            .into_iter()
            .find(|d| (cur == start && *d == start_dir) || edges[cur] & d.bit() != 0);
        match next {
            Some(d) if cur == start && d == start_dir => break,
            Some(d) => {
                if d != dir {
                    poly.push(vertex(cur)?);
                }
                dir = d;
            }
            None => break,
        }
    }
    Some(poly)
}

#[inline]
fn vertex(pos: (usize, usize)) -> Option<Point2d> {
    Point2d::from_idx(pos)
}
