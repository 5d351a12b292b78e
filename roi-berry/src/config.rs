//! 引擎配置.
//!
//! 所有配置项都有默认值. [`EngineConfig::from_env_or_default`] 从环境变量读取覆盖值:
//!
//! | 变量 | 含义 | 默认值 |
//! |---|---|---|
//! | `ROI_MAX_INTERNAL_HOLE` | 自动填充的最大空洞像素数 | `9` |
//! | `ROI_MAX_ISTHMUS_WIDTH` | 细颈宽度 (像素) | `5` |
//! | `ROI_TRANSECT_THRESHOLDS` | 剖面高亮区间 `low,high` | `10,40` |
//! | `ROI_TRANSECT_SCALING` | 剖面距离缩放, `mm` 或 `aspect` | `mm` |

use crate::consts::{DEFAULT_MAX_INTERNAL_HOLE, DEFAULT_MAX_ISTHMUS_WIDTH, GRID_SIZE};
use crate::draw::DrawLimits;
use crate::error::{RoiError, RoiResult};
use crate::transect::{DistanceScaling, TransectThresholds};
use std::env;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const KEY_MAX_INTERNAL_HOLE: &str = "ROI_MAX_INTERNAL_HOLE";
const KEY_MAX_ISTHMUS_WIDTH: &str = "ROI_MAX_ISTHMUS_WIDTH";
const KEY_TRANSECT_THRESHOLDS: &str = "ROI_TRANSECT_THRESHOLDS";
const KEY_TRANSECT_SCALING: &str = "ROI_TRANSECT_SCALING";

/// 几何引擎的全部可调参数.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EngineConfig {
    max_internal_hole: u32,
    max_isthmus_width: u32,
    transect_thresholds: TransectThresholds,
    distance_scaling: DistanceScaling,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_internal_hole: DEFAULT_MAX_INTERNAL_HOLE,
            max_isthmus_width: DEFAULT_MAX_ISTHMUS_WIDTH,
            transect_thresholds: TransectThresholds::default(),
            distance_scaling: DistanceScaling::default(),
        }
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> RoiError {
    RoiError::InvalidConfig {
        key,
        reason: reason.into(),
    }
}

fn parse_number<T: FromStr>(key: &'static str, raw: &str) -> RoiResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(key, format!("`{raw}` is not a number")))
}

fn parse_thresholds(raw: &str) -> RoiResult<TransectThresholds> {
    let key = KEY_TRANSECT_THRESHOLDS;
    let (low, high) = raw
        .split_once(',')
        .ok_or_else(|| invalid(key, "expected `low,high`"))?;
    let low: f64 = parse_number(key, low)?;
    let high: f64 = parse_number(key, high)?;
    TransectThresholds::new(low, high).ok_or_else(|| invalid(key, "need finite low <= high"))
}

fn parse_scaling(raw: &str) -> RoiResult<DistanceScaling> {
    match raw.trim() {
        "mm" => Ok(DistanceScaling::Millimetre),
        "aspect" => Ok(DistanceScaling::AspectRatio),
        other => Err(invalid(
            KEY_TRANSECT_SCALING,
            format!("`{other}` is neither `mm` nor `aspect`"),
        )),
    }
}

impl EngineConfig {
    /// 构造并检查配置. 细颈宽度不能超过切片边长.
    pub fn new(
        max_internal_hole: u32,
        max_isthmus_width: u32,
        transect_thresholds: TransectThresholds,
        distance_scaling: DistanceScaling,
    ) -> RoiResult<Self> {
        if max_isthmus_width as usize > GRID_SIZE {
            return Err(invalid(
                KEY_MAX_ISTHMUS_WIDTH,
                format!("{max_isthmus_width} exceeds the slice size {GRID_SIZE}"),
            ));
        }
        Ok(Self {
            max_internal_hole,
            max_isthmus_width,
            transect_thresholds,
            distance_scaling,
        })
    }

    /// 以 `lookup` 查询各配置项, 缺失的项使用默认值, 格式错误的项报错.
    pub fn from_lookup<F>(lookup: F) -> RoiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let max_internal_hole = match lookup(KEY_MAX_INTERNAL_HOLE) {
            Some(raw) => parse_number(KEY_MAX_INTERNAL_HOLE, &raw)?,
            None => d.max_internal_hole,
        };
        let max_isthmus_width = match lookup(KEY_MAX_ISTHMUS_WIDTH) {
            Some(raw) => parse_number(KEY_MAX_ISTHMUS_WIDTH, &raw)?,
            None => d.max_isthmus_width,
        };
        let transect_thresholds = match lookup(KEY_TRANSECT_THRESHOLDS) {
            Some(raw) => parse_thresholds(&raw)?,
            None => d.transect_thresholds,
        };
        let distance_scaling = match lookup(KEY_TRANSECT_SCALING) {
            Some(raw) => parse_scaling(&raw)?,
            None => d.distance_scaling,
        };
        Self::new(
            max_internal_hole,
            max_isthmus_width,
            transect_thresholds,
            distance_scaling,
        )
    }

    /// 从环境变量读取配置.
    ///
    /// 1. 变量存在时使用其值, 格式错误时返回 `RoiError::InvalidConfig`;
    /// 2. 否则使用默认值.
    pub fn from_env_or_default() -> RoiResult<Self> {
        let cfg = Self::from_lookup(|key| env::var(key).ok())?;
        log::debug!("engine config: {cfg:?}");
        Ok(cfg)
    }

    /// 自动填充的最大空洞像素数.
    #[inline]
    pub fn max_internal_hole(&self) -> u32 {
        self.max_internal_hole
    }

    /// 细颈宽度.
    #[inline]
    pub fn max_isthmus_width(&self) -> u32 {
        self.max_isthmus_width
    }

    /// 剖面高亮区间.
    #[inline]
    pub fn transect_thresholds(&self) -> TransectThresholds {
        self.transect_thresholds
    }

    /// 剖面距离缩放方式.
    #[inline]
    pub fn distance_scaling(&self) -> DistanceScaling {
        self.distance_scaling
    }

    /// 描绘后处理的限制.
    #[inline]
    pub fn draw_limits(&self) -> DrawLimits {
        DrawLimits {
            max_internal_hole: self.max_internal_hole,
            max_isthmus_width: self.max_isthmus_width,
        }
    }
}
