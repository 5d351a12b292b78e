use crate::Idx2d;

/// 行优先索引迭代器. 掩膜的区域搜索与边界追踪都按照该顺序扫描,
/// 因此它们的输出顺序是确定的.
///
/// 与 `(0..h).flat_map(..)` 相比, 该结构体积更小, 并且能给出精确的剩余长度.
#[derive(Debug, Clone)]
pub struct PosIter {
    next: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    /// 迭代形状为 `(h, w)` 的所有索引.
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self { next: 0, h, w }
    }

    #[inline]
    fn total(&self) -> usize {
        self.h * self.w
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total() {
            return None;
        }
        let pos = (self.next / self.w, self.next % self.w);
        self.next += 1;
        Some(pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.total().saturating_sub(self.next);
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for PosIter {}
