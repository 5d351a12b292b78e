//! 合法但可能为空的计算结果.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 计算结果: 产生了内容, 或者合法地为空.
///
/// 与 [`crate::RoiError`] 不同, `Empty` 不代表失败. 例如收缩一个很小的 ROI,
/// 或者两个相同 ROI 求差, 都会在对应切片上得到 `Empty`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// 产生了非空结果.
    Produced(T),

    /// 结果合法地为空.
    Empty,
}

impl<T> Outcome<T> {
    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// 是否产生了结果.
    #[inline]
    pub fn is_produced(&self) -> bool {
        !self.is_empty()
    }

    /// 获取内部结果的引用.
    #[inline]
    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Self::Produced(v) => Outcome::Produced(v),
            Self::Empty => Outcome::Empty,
        }
    }

    /// 对内部结果做映射.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Produced(v) => Outcome::Produced(f(v)),
            Self::Empty => Outcome::Empty,
        }
    }

    /// 转换为 `Option`.
    #[inline]
    pub fn produced(self) -> Option<T> {
        self.into()
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    #[inline]
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Produced(v),
            None => Self::Empty,
        }
    }
}

impl<T> From<Outcome<T>> for Option<T> {
    #[inline]
    fn from(value: Outcome<T>) -> Self {
        match value {
            Outcome::Produced(v) => Some(v),
            Outcome::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Outcome;

    #[test]
    fn test_option_conversion() {
        let o: Outcome<u32> = Some(3).into();
        assert_eq!(o, Outcome::Produced(3));
        assert!(o.is_produced());
        assert_eq!(o.map(|v| v * 2).produced(), Some(6));

        let e: Outcome<u32> = None.into();
        assert!(e.is_empty());
        assert_eq!(e.as_ref(), Outcome::Empty);
    }
}
