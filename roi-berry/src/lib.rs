#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 为放疗结构集 (RTSTRUCT) 中的 ROI 轮廓提供二维几何引擎:
//! 剖面采样, 轮廓描绘, ROI 集合运算, 以及与结构集存储之间的双向转换.
//!
//! 该 crate 只提供 `safe` 接口, 所有计算都是同步的, 且不修改输入.
//! 需要离开交互路径运行时, 使用 [`job::spawn`].
//!
//! # 注意
//!
//! 1. 像素坐标 [`Point2d`] 为 `(x, y)`, 即 (列, 行); 掩膜内部索引
//!   [`Idx2d`] 为 `(h, w)`, 即 (行, 列). 两者之间的转换只发生在
//!   [`data::point`] 中.
//! 2. 轮廓顶点位于像素的左上角 ("裂缝" 坐标), 因此取值范围为 `0..=width`.
//!   多边形 -> 掩膜 -> 多边形的往返转换是精确的.
//! 3. 用户输入不会导致 panic. 非法输入返回 [`RoiError`],
//!   合法但结果为空时返回 [`Outcome::Empty`].
//!
//! # 开发计划
//!
//! ### 栅格工具 ✅
//!
//! DDA 直线栅格化, 越界裁剪, 多边形扫描线填充与裂缝边界追踪.
//!
//! 实现位于 `roi-berry/src/raster`.
//!
//! ### 剖面采样 ✅
//!
//! 沿用户画出的线段采样像素值与距离, 并按阈值区间高亮.
//!
//! 实现位于 `roi-berry/src/transect.rs`.
//!
//! ### 轮廓描绘 ✅
//!
//! 手绘/种子生长/画笔输入, 带内部空洞填充和细颈切断.
//!
//! 实现位于 `roi-berry/src/draw.rs` 和 `roi-berry/src/morph`.
//!
//! ### ROI 集合运算 ✅
//!
//! 扩张, 收缩, 内/外环, 并, 交, 差.
//!
//! 实现位于 `roi-berry/src/setops`.
//!
//! ### 结构集适配 ✅
//!
//! 像素 <-> 病人坐标转换, 修订号并发控制, 压缩归档.
//!
//! 实现位于 `roi-berry/src/store`.

pub mod config;
pub mod consts;
pub mod contour;
pub mod data;
pub mod draw;
pub mod error;
pub mod job;
pub mod morph;
pub mod outcome;
pub mod prelude;
pub mod raster;
pub mod setops;
pub mod store;
pub mod transect;

pub use config::EngineConfig;
pub use contour::{Contour, ContourSet, Roi, RoiId};
pub use data::mask::RoiMask;
pub use data::point::{euclidean_distance, in_bounds, Grid, PixelSpacing, Point2d};
pub use data::scan::{OwnedScanSlice, ScanSlice};
pub use error::{RoiError, RoiResult};
pub use outcome::Outcome;

/// 二维索引 `(h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 像素谓词.
type Predicate = fn(u8) -> bool;

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;
