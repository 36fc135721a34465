//! 订阅生命周期：能力检查、权限协商、监听注册、事件泵与注销
//!
//! 全部状态变更都发生在消费者线程的 [`FeedEngine::pump`] 调用里，
//! 事件逐条跑完再取下一条，不存在重入。唯一的异步悬挂点是授权
//! 结果经回执送达。

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};

use crate::feed::consent::{ConsentProbe, NegotiationStatus};
use crate::feed::merger;
use crate::feed::throttle::ThrottleGate;
use crate::platform::{Capability, CapabilitySupport, ListenerId, SensorPlatform};
use crate::types::{FeedError, RawEvent, Reading};
use crate::utils;

/// 订阅参数
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// 对外快照更新的最小间隔
    pub update_interval: Duration,
    /// 原始事件缓冲容量，写满时平台侧丢弃事件
    pub event_buffer: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(100),
            event_buffer: 1024,
        }
    }
}

impl FeedOptions {
    /// 以毫秒指定更新间隔的便捷构造
    pub fn with_interval_ms(ms: u64) -> Self {
        Self {
            update_interval: Duration::from_millis(ms),
            ..Self::default()
        }
    }
}

/// 订阅对外可见的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// 权限协商进行中，快照保持初始值
    Negotiating,
    /// 监听器已注册，事件正常流入
    Subscribed,
    /// 终态故障，只有重新订阅才能恢复
    Errored,
    /// 已注销
    Detached,
}

enum Phase {
    Negotiating { probes: Vec<ConsentProbe> },
    Subscribed { listeners: Vec<(Capability, ListenerId)> },
    Errored,
    Detached { probes: Vec<ConsentProbe> },
}

enum Verdict {
    Pending,
    AllGranted,
    Failed(FeedError),
}

/// 轮询一组协商探针并给出整体裁决
///
/// 任何一项被拒或缺失即整体失败，全部获准才算通过。
fn poll_probes(probes: &mut [ConsentProbe]) -> Verdict {
    let mut pending = false;
    for probe in probes.iter_mut() {
        match probe.poll() {
            NegotiationStatus::Granted => {}
            NegotiationStatus::Pending => pending = true,
            NegotiationStatus::Denied => return Verdict::Failed(FeedError::PermissionDenied),
            NegotiationStatus::Unsupported => {
                return Verdict::Failed(FeedError::CapabilityUnsupported(probe.capability()))
            }
        }
    }
    if pending {
        Verdict::Pending
    } else {
        Verdict::AllGranted
    }
}

/// 两个订阅变体共用的生命周期引擎
pub(crate) struct FeedEngine {
    platform: Arc<dyn SensorPlatform>,
    capabilities: Vec<Capability>,
    mounted: bool,
    phase: Phase,
    reading: Reading,
    gate: ThrottleGate,
    events_tx: Sender<RawEvent>,
    events_rx: Receiver<RawEvent>,
}

impl FeedEngine {
    /// 创建订阅：同步完成能力检查并发起全部授权协商
    ///
    /// 能力检查按给定顺序进行，第一个缺失的能力决定错误码。
    /// 隐式同意的平台在这里就直达 Subscribed。
    pub(crate) fn open(
        platform: Arc<dyn SensorPlatform>,
        capabilities: &[Capability],
        options: FeedOptions,
    ) -> Self {
        let (events_tx, events_rx) = bounded(options.event_buffer.max(1));
        let gate = ThrottleGate::new(options.update_interval);
        let mut reading = Reading::default();

        // 能力检查：任一能力缺失则直接进入终态，不发起任何协商
        for &capability in capabilities {
            if platform.capability(capability) == CapabilitySupport::Unsupported {
                warn!("{} capability not supported, subscription failed", capability);
                reading.error = Some(FeedError::CapabilityUnsupported(capability));
                return Self {
                    platform,
                    capabilities: capabilities.to_vec(),
                    mounted: true,
                    phase: Phase::Errored,
                    reading,
                    gate,
                    events_tx,
                    events_rx,
                };
            }
        }

        // 所有能力并行协商，结果统一轮询
        let probes = capabilities
            .iter()
            .map(|&capability| ConsentProbe::begin(platform.as_ref(), capability))
            .collect();
        let mut engine = Self {
            platform,
            capabilities: capabilities.to_vec(),
            mounted: true,
            phase: Phase::Negotiating { probes },
            reading,
            gate,
            events_tx,
            events_rx,
        };
        engine.advance_negotiation();
        engine
    }

    /// 推进状态机一步，由消费者在自己的循环里定期调用
    pub(crate) fn pump(&mut self) {
        self.pump_at(Instant::now(), utils::now_ms());
    }

    /// [`pump`](Self::pump) 的可注入时钟版本，测试用
    pub(crate) fn pump_at(&mut self, now: Instant, now_ms: i64) {
        match self.phase {
            Phase::Negotiating { .. } => self.advance_negotiation(),
            Phase::Subscribed { .. } => self.drain_events(now, now_ms),
            Phase::Errored => {}
            Phase::Detached { .. } => {
                // 注销后：残留事件一律丢弃，未完成的协商仍要收尾
                while self.events_rx.try_recv().is_ok() {}
                self.settle_leftover_negotiation();
            }
        }
    }

    /// 当前合并快照
    pub(crate) fn reading(&self) -> Reading {
        self.reading
    }

    /// 当前阶段
    pub(crate) fn phase(&self) -> FeedPhase {
        match self.phase {
            Phase::Negotiating { .. } => FeedPhase::Negotiating,
            Phase::Subscribed { .. } => FeedPhase::Subscribed,
            Phase::Errored => FeedPhase::Errored,
            Phase::Detached { .. } => FeedPhase::Detached,
        }
    }

    /// 注销订阅，任何阶段调用都安全且幂等
    ///
    /// 只注销本订阅登记过的句柄，已经排队的事件不再反映到快照。
    pub(crate) fn detach(&mut self) {
        if matches!(self.phase, Phase::Detached { .. }) {
            return;
        }
        self.mounted = false;

        let previous = std::mem::replace(&mut self.phase, Phase::Detached { probes: Vec::new() });
        match previous {
            Phase::Subscribed { listeners } => {
                for (capability, id) in listeners {
                    self.platform.deregister_listener(id);
                    debug!("{} listener deregistered: {:?}", capability, id);
                }
                info!("subscription detached");
            }
            Phase::Negotiating { probes } => {
                // 协商途中注销：保留探针以便收尾，注册被永久跳过
                self.phase = Phase::Detached { probes };
                info!("subscription detached during negotiation");
            }
            Phase::Errored | Phase::Detached { .. } => {}
        }
    }

    /// 轮询协商探针；全数获准且仍处挂载状态时注册监听器
    fn advance_negotiation(&mut self) {
        let Phase::Negotiating { probes } = &mut self.phase else {
            return;
        };
        match poll_probes(probes) {
            Verdict::Pending => {}
            Verdict::Failed(error) => {
                // 整体失败，绝不注册任何监听器
                warn!("negotiation failed: {}", error);
                self.reading.error = Some(error);
                self.phase = Phase::Errored;
            }
            Verdict::AllGranted => {
                // 注册前最后确认挂载状态
                if !self.mounted {
                    debug!("consents granted after teardown, registration skipped");
                    self.phase = Phase::Detached { probes: Vec::new() };
                    return;
                }
                let listeners = self.register_listeners();
                info!("subscription live with {} listener(s)", listeners.len());
                self.phase = Phase::Subscribed { listeners };
            }
        }
    }

    /// 注销后收尾遗留的协商
    ///
    /// 迟到的拒绝仍然记录到快照，迟到的批准不注册任何监听器。
    fn settle_leftover_negotiation(&mut self) {
        let Phase::Detached { probes } = &mut self.phase else {
            return;
        };
        if probes.is_empty() {
            return;
        }
        match poll_probes(probes) {
            Verdict::Pending => {}
            Verdict::Failed(error) => {
                warn!("negotiation failed after teardown: {}", error);
                if self.reading.error.is_none() {
                    self.reading.error = Some(error);
                }
                self.phase = Phase::Detached { probes: Vec::new() };
            }
            Verdict::AllGranted => {
                debug!("consents granted after teardown, registration skipped");
                self.phase = Phase::Detached { probes: Vec::new() };
            }
        }
    }

    /// 按到达顺序消化原始事件，节流门放行的经合并器写入快照
    fn drain_events(&mut self, now: Instant, now_ms: i64) {
        if !self.mounted {
            return;
        }
        while let Ok(event) = self.events_rx.try_recv() {
            if self.gate.admit(now) {
                self.reading = merger::fold(self.reading, &event, now_ms);
                debug!("reading updated at {}", self.reading.timestamp);
            }
            // 窗口内到达的事件整体丢弃
        }
    }

    fn register_listeners(&self) -> Vec<(Capability, ListenerId)> {
        self.capabilities
            .iter()
            .map(|&capability| {
                let id = self
                    .platform
                    .register_listener(capability, self.events_tx.clone());
                debug!("{} listener registered: {:?}", capability, id);
                (capability, id)
            })
            .collect()
    }
}

impl Drop for FeedEngine {
    fn drop(&mut self) {
        self.detach();
    }
}
