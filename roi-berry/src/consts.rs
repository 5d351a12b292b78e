//! 通用常量.

/// 单通道掩膜像素值.
pub mod gray {
    /// 掩膜中背景的像素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 掩膜中前景 (ROI 内部) 的像素值.
    pub const MASK_FOREGROUND: u8 = 1;

    /// 细颈检测时, 开运算之外的残余前景.
    pub const MASK_RESIDUE: u8 = 2;

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, MASK_BACKGROUND)
    }

    /// 像素是否是前景?
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        matches!(p, MASK_FOREGROUND)
    }

    /// 像素是否是残余前景?
    #[inline]
    pub const fn is_residue(p: u8) -> bool {
        matches!(p, MASK_RESIDUE)
    }
}

/// DICOM 切片的标准边长 (像素).
pub const GRID_SIZE: usize = 512;

/// 默认允许自动填充的内部空洞大小 (像素数).
pub const DEFAULT_MAX_INTERNAL_HOLE: u32 = 9;

/// 默认细颈宽度 (像素).
pub const DEFAULT_MAX_ISTHMUS_WIDTH: u32 = 5;

/// 默认剖面高亮区间 (到终点的像素距离).
pub const DEFAULT_TRANSECT_THRESHOLDS: [f64; 2] = [10.0, 40.0];

/// 像素类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ElemType {
    /// 背景.
    Background,

    /// 前景.
    Foreground,
}

impl ElemType {
    /// 是否为前景.
    #[inline]
    pub fn is_foreground(&self) -> bool {
        matches!(self, Self::Foreground)
    }

    /// 是否为背景.
    #[inline]
    pub fn is_background(&self) -> bool {
        !self.is_foreground()
    }
}
