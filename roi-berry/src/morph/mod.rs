//! 二维形态学操作: 欧氏圆盘膨胀/腐蚀, 内部空洞填充与细颈切断.
//!
//! 膨胀与腐蚀都基于精确的平方欧氏距离变换, 因此半径为 `r` 的圆盘定义为
//! `{(dh, dw) | dh² + dw² <= r²}`, 与掩膜大小无关地精确.

mod isthmus;

pub use isthmus::{cut_isthmuses, open_square};

use crate::consts::gray::*;
use crate::data::mask::RoiMask;
use ndarray::{Array2, ArrayView2, Axis};

/// 以抛物线下包络计算一维平方距离 (Felzenszwalb & Huttenlocher).
///
/// `f[i]` 为无穷时表示 `i` 不是站点. 没有任何站点时输出全为无穷.
fn lower_envelope(f: &[f64], out: &mut [f64]) {
    // v: 下包络中的抛物线顶点, z: 各抛物线开始占优的位置.
    let mut v: Vec<usize> = Vec::with_capacity(f.len());
    let mut z: Vec<f64> = Vec::with_capacity(f.len());

    for (q, &fq) in f.iter().enumerate().filter(|(_, fq)| fq.is_finite()) {
        let hq = fq + (q * q) as f64;
        let mut s = f64::NEG_INFINITY;
        while let (Some(&p), Some(&zp)) = (v.last(), z.last()) {
            let cand = (hq - (f[p] + (p * p) as f64)) / (2.0 * (q - p) as f64);
            if cand <= zp {
                v.pop();
                z.pop();
            } else {
                s = cand;
                break;
            }
        }
        v.push(q);
        z.push(s);
    }

    if v.is_empty() {
        out.fill(f64::INFINITY);
        return;
    }
    let mut k = 0;
    for (q, o) in out.iter_mut().enumerate() {
        while k + 1 < v.len() && z[k + 1] < q as f64 {
            k += 1;
        }
        let d = q as f64 - v[k] as f64;
        *o = d * d + f[v[k]];
    }
}

/// 每个位置到最近站点 (`sites` 中为真的位置) 的平方欧氏距离.
fn squared_distance_to(sites: ArrayView2<bool>) -> Array2<f64> {
    let mut g = sites.mapv(|s| if s { 0.0 } else { f64::INFINITY });
    let mut buf = Vec::new();
    for axis in [Axis(0), Axis(1)] {
        for mut lane in g.lanes_mut(axis) {
            buf.clear();
            buf.extend(lane.iter().copied());
            let mut out = vec![0.0; buf.len()];
            lower_envelope(&buf, &mut out);
            lane.iter_mut().zip(out).for_each(|(l, o)| *l = o);
        }
    }
    g
}

/// 以半径为 `radius` 像素的欧氏圆盘膨胀. 结果总是包含原掩膜.
pub fn dilate(mask: &RoiMask, radius: u32) -> RoiMask {
    if radius == 0 || mask.is_empty() {
        return mask.clone();
    }
    let sites = mask.array_view().mapv(is_foreground);
    let d2 = squared_distance_to(sites.view());
    let r2 = f64::from(radius).powi(2);
    RoiMask::from_fn(mask.grid(), |pos| d2[pos] <= r2)
}

/// 以半径为 `radius` 像素的欧氏圆盘腐蚀. 网格之外视为背景. 结果总是被原掩膜包含.
pub fn erode(mask: &RoiMask, radius: u32) -> RoiMask {
    if radius == 0 || mask.is_empty() {
        return mask.clone();
    }
    let (h, w) = mask.shape();
    // 外围补一圈背景.
    let mut sites = Array2::from_elem((h + 2, w + 2), true);
    for ((ph, pw), &v) in mask.indexed_iter() {
        sites[(ph + 1, pw + 1)] = !is_foreground(v);
    }
    let d2 = squared_distance_to(sites.view());
    let r2 = f64::from(radius).powi(2);
    RoiMask::from_fn(mask.grid(), |(ph, pw)| d2[(ph + 1, pw + 1)] > r2)
}

/// 填充所有不接触图像边缘, 且像素数不超过 `max_hole` 的 4-连通背景区域.
///
/// 返回填充后的掩膜和被填充的空洞个数.
pub fn fill_holes(mask: &RoiMask, max_hole: u32) -> (RoiMask, usize) {
    let mut ans = mask.clone();
    let mut filled = 0;
    for area in mask.background_areas() {
        if area.len() <= max_hole as usize && mask.all_within(&area) {
            ans.fill_batch(area, MASK_FOREGROUND);
            filled += 1;
        }
    }
    (ans, filled)
}
