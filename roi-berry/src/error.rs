//! 运行时错误.

use crate::data::point::Grid;
use thiserror::Error;

/// 几何引擎与结构集适配层的运行时错误.
///
/// 合法但结果为空的情况不是错误, 见 [`crate::Outcome`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoiError {
    /// 退化的输入几何 (零长度线段, 空输入等).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    /// 二元运算的两个 ROI 不在同一个网格上.
    #[error("geometry mismatch: {left:?} vs {right:?}")]
    GeometryMismatch {
        /// 左操作数的网格.
        left: Grid,
        /// 右操作数的网格.
        right: Grid,
    },

    /// 提交时目标 ROI 已被其它提交更新.
    ///
    /// `expected` 为开始提交时记录的修订号, `found` 为当前修订号.
    #[error("stale write to ROI `{name}`: expected revision {expected}, found {found}")]
    StaleWrite {
        /// 目标 ROI 名称.
        name: String,
        /// 开始提交时的修订号.
        expected: u64,
        /// 当前修订号.
        found: u64,
    },

    /// 环形运算的内外半径不满足 `inner < outer`.
    #[error("invalid margin: inner {inner} must be smaller than outer {outer}")]
    InvalidMargin {
        /// 内半径.
        inner: u32,
        /// 外半径.
        outer: u32,
    },

    /// ROI 编号已经用到 `u32::MAX`, 无法再分配新编号.
    #[error("ROI numbers exhausted")]
    RoiNumbersExhausted,

    /// 结构集中不存在该名称的 ROI.
    #[error("unknown ROI `{0}`")]
    UnknownRoi(String),

    /// 不存在该切片, 或病人坐标无法对应到任何切片.
    #[error("unknown slice {0}")]
    UnknownSlice(usize),

    /// 配置项不合法.
    #[error("invalid configuration `{key}`: {reason}")]
    InvalidConfig {
        /// 配置项名称.
        key: &'static str,
        /// 原因.
        reason: String,
    },

    /// 压缩归档的编码或解码失败.
    #[cfg(feature = "serde")]
    #[error("archive error: {0}")]
    Archive(String),
}

/// 本 crate 的通用结果类型.
pub type RoiResult<T> = Result<T, RoiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_context() {
        let e = RoiError::StaleWrite {
            name: "PTV".to_string(),
            expected: 1,
            found: 2,
        };
        let s = e.to_string();
        assert!(s.contains("PTV"));
        assert!(s.contains('1') && s.contains('2'));

        let e = RoiError::InvalidMargin { inner: 3, outer: 3 };
        assert!(e.to_string().contains("inner 3"));
    }
}
