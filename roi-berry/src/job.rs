//! 把引擎调用移出交互路径: 在后台线程运行, 通过 [`Pending`] 取回结果.
//!
//! 引擎本身是同步的. 放弃 ([`Pending::abandon`]) 只是建议性的:
//! 计算照常完成, 结果被丢弃.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// 后台任务的结果通道.
#[derive(Debug)]
pub struct Pending<T> {
    rx: Receiver<thread::Result<T>>,
    abandoned: Arc<AtomicBool>,
}

/// 取结果时的状态.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobError {
    /// 任务还没有完成.
    NotReady,
    /// 任务 panic 了, 或结果已被取走.
    Lost,
}

/// 在新线程中运行 `op`.
pub fn spawn<T, F>(op: F) -> Pending<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let abandoned = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&abandoned);
    thread::spawn(move || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(op));
        if flag.load(Ordering::Acquire) {
            log::debug!("background job finished after being abandoned");
            return;
        }
        // 接收端已经被丢弃时没有人关心结果.
        let _ = tx.send(result);
    });
    Pending { rx, abandoned }
}

impl<T> Pending<T> {
    /// 阻塞直到任务完成.
    pub fn wait(self) -> Result<T, JobError> {
        match self.rx.recv() {
            Ok(Ok(v)) => Ok(v),
            _ => Err(JobError::Lost),
        }
    }

    /// 非阻塞地尝试取结果.
    pub fn try_take(&self) -> Result<T, JobError> {
        match self.rx.try_recv() {
            Ok(Ok(v)) => Ok(v),
            Err(TryRecvError::Empty) => Err(JobError::NotReady),
            Ok(Err(_)) | Err(TryRecvError::Disconnected) => Err(JobError::Lost),
        }
    }

    /// 放弃结果. 计算不会被中断.
    pub fn abandon(self) {
        self.abandoned.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn test_wait() {
        let p = spawn(|| (1..=10).sum::<i32>());
        assert_eq!(p.wait(), Ok(55));
    }

    #[test]
    fn test_try_take() {
        let (go, gate) = channel::<()>();
        let p = spawn(move || {
            gate.recv().unwrap();
            7
        });
        assert_eq!(p.try_take(), Err(JobError::NotReady));
        go.send(()).unwrap();
        let v = loop {
            match p.try_take() {
                Err(JobError::NotReady) => thread::sleep(Duration::from_millis(1)),
                other => break other,
            }
        };
        assert_eq!(v, Ok(7));
    }

    #[test]
    fn test_abandon_still_runs() {
        let (done_tx, done_rx) = channel();
        let (go, gate) = channel::<()>();
        let p = spawn(move || {
            gate.recv().unwrap();
            done_tx.send(()).unwrap();
        });
        p.abandon();
        go.send(()).unwrap();
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_panic_is_lost() {
        let p = spawn(|| -> i32 { panic!("boom") });
        assert_eq!(p.wait(), Err(JobError::Lost));
    }
}
