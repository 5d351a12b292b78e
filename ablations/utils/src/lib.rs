//! 消融实验依赖的通用组件.

use std::env;

pub mod phantom;

const SEP: &str = "--------------------------------------------------------";

/// 默认的体模切片数.
const DEFAULT_SLICES: usize = 48;

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 获取体模切片数.
///
/// 1. 若环境变量 `$ABLATION_SLICES` 是正整数, 则返回其值;
/// 2. 否则, 返回 48.
pub fn slices_from_env_or_default() -> usize {
    env::var("ABLATION_SLICES")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_SLICES)
}
