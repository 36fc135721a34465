//! 前沿节流门：约束对外快照的更新频率

use std::time::{Duration, Instant};

/// 前沿节流门
///
/// 静默期后的第一次调用立即放行并开启窗口；窗口内的后续调用被
/// 整体丢弃，不排队也不合并，窗口期满后的下一次调用再次立即放行。
/// 被丢弃的更新不会补发。
#[derive(Debug)]
pub struct ThrottleGate {
    interval: Duration,
    /// 最近一次放行的时刻，None 表示从未放行
    last_admitted: Option<Instant>,
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
        }
    }

    /// 判定 now 时刻到达的更新是否放行，放行时同步推进窗口
    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last_admitted {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
