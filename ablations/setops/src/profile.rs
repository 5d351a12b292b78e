//! 算法运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 获得总共累计下来的时间综合 (以微秒为单位).
    #[inline]
    fn get_total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 一种运算的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 结果非空的切片数.
    produced: u64,

    /// 结果为空的切片数.
    empty: u64,

    /// 运算次数.
    runs: u64,

    /// 运算本身花费的总时间.
    op_time: AccTimer,

    /// 整个任务花费的总时间 (包括准备体模).
    real_time: AccTimer,

    /// 最耗时的一次运算.
    most: Option<Duration>,

    /// 结果中的轮廓总数.
    contours: u64,
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            produced: 0,
            empty: 0,
            runs: 0,
            op_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
            contours: 0,
        }
    }

    /// 开始一次运算计时.
    #[inline]
    pub fn op_start(&mut self) {
        self.runs += 1;
        self.op_time.start();
    }

    /// 结束一次运算计时.
    #[inline]
    pub fn op_elapsed(&mut self) {
        let d = self.op_time.elapsed();
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
    }

    /// 记录一张切片的结果.
    #[inline]
    pub fn count_slice(&mut self, contours: Option<usize>) {
        match contours {
            Some(n) => {
                self.produced += 1;
                self.contours += n as u64;
            }
            None => self.empty += 1,
        }
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 非空切片数.
    #[inline]
    pub fn get_produced(&self) -> u64 {
        self.produced
    }

    /// 空切片数.
    #[inline]
    pub fn get_empty(&self) -> u64 {
        self.empty
    }

    /// 轮廓总数.
    #[inline]
    pub fn get_contours(&self) -> u64 {
        self.contours
    }

    /// 以微秒为单位获得运算总时间.
    #[inline]
    pub fn get_op_time_us(&self) -> u64 {
        self.op_time.get_total_us()
    }

    /// 以微秒为单位获得任务总时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.get_total_us()
    }

    /// 以微秒为单位获得每次运算的平均时间.
    #[inline]
    pub fn get_avg_op_time_us(&self) -> Option<f64> {
        match self.runs {
            0 => None,
            runs => Some(self.get_op_time_us() as f64 / runs as f64),
        }
    }

    /// 最耗时的一次运算. 没有运算时返回 `None`.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
