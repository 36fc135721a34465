//! 进程内模拟平台
//!
//! 授权流程可脚本化，事件由调用方手工注入，供测试与离线演示使用。
//! 克隆共享同一内部状态，便于一端驱动、一端订阅。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use log::debug;

use crate::platform::{
    Capability, CapabilitySupport, ConsentOutcome, ConsentResolver, ConsentTicket, ListenerId,
    ListenerRegistry, SensorPlatform,
};
use crate::types::{MotionSample, OrientationSample, RawEvent};

/// 某项能力的授权脚本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentScript {
    /// 请求立即获准
    Grant,
    /// 请求立即拒绝
    Deny,
    /// 授权调用本身失败，回执直接失效
    Fault,
    /// 挂起，等待 [`SimulatedPlatform::resolve_consent`] 手工裁决
    Manual,
}

struct SimState {
    support: HashMap<Capability, CapabilitySupport>,
    scripts: HashMap<Capability, ConsentScript>,
    pending: Vec<(Capability, ConsentResolver)>,
    consent_calls: HashMap<Capability, usize>,
    deregistered: Vec<ListenerId>,
}

struct SimInner {
    registry: ListenerRegistry,
    state: Mutex<SimState>,
}

/// 可脚本化的模拟平台
#[derive(Clone)]
pub struct SimulatedPlatform {
    inner: Arc<SimInner>,
}

impl SimulatedPlatform {
    /// 新建平台，默认两项能力都支持且无需授权
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SimInner {
                registry: ListenerRegistry::new(),
                state: Mutex::new(SimState {
                    support: HashMap::new(),
                    scripts: HashMap::new(),
                    pending: Vec::new(),
                    consent_calls: HashMap::new(),
                    deregistered: Vec::new(),
                }),
            }),
        }
    }

    /// 设定某项能力的支持程度
    pub fn set_support(&self, capability: Capability, support: CapabilitySupport) {
        self.inner
            .state
            .lock()
            .unwrap()
            .support
            .insert(capability, support);
    }

    /// 设定授权脚本，同时把该能力标记为 `RequiresConsent`
    pub fn script_consent(&self, capability: Capability, script: ConsentScript) {
        let mut state = self.inner.state.lock().unwrap();
        state
            .support
            .insert(capability, CapabilitySupport::RequiresConsent);
        state.scripts.insert(capability, script);
    }

    /// 手工裁决该能力所有挂起的授权请求，返回裁决数量
    pub fn resolve_consent(&self, capability: Capability, outcome: ConsentOutcome) -> usize {
        let pending = {
            let mut state = self.inner.state.lock().unwrap();
            std::mem::take(&mut state.pending)
        };
        let mut resolved = 0;
        let mut keep = Vec::new();
        for (cap, resolver) in pending {
            if cap == capability {
                resolver.resolve(outcome);
                resolved += 1;
            } else {
                keep.push((cap, resolver));
            }
        }
        self.inner.state.lock().unwrap().pending.extend(keep);
        resolved
    }

    /// 注入一条运动事件，返回投递到的监听器数量
    pub fn emit_motion(&self, sample: MotionSample) -> usize {
        self.inner.registry.dispatch(RawEvent::Motion(sample))
    }

    /// 注入一条姿态事件，返回投递到的监听器数量
    pub fn emit_orientation(&self, sample: OrientationSample) -> usize {
        self.inner.registry.dispatch(RawEvent::Orientation(sample))
    }

    /// 该能力累计收到的授权请求次数
    pub fn consent_requests(&self, capability: Capability) -> usize {
        self.inner
            .state
            .lock()
            .unwrap()
            .consent_calls
            .get(&capability)
            .copied()
            .unwrap_or(0)
    }

    /// 当前登记的监听器数量
    pub fn listener_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// 当前登记的全部句柄
    pub fn listener_ids(&self) -> Vec<ListenerId> {
        self.inner.registry.ids()
    }

    /// 已注销的句柄，按注销顺序
    pub fn deregistered_ids(&self) -> Vec<ListenerId> {
        self.inner.state.lock().unwrap().deregistered.clone()
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPlatform for SimulatedPlatform {
    fn capability(&self, capability: Capability) -> CapabilitySupport {
        self.inner
            .state
            .lock()
            .unwrap()
            .support
            .get(&capability)
            .copied()
            .unwrap_or(CapabilitySupport::Supported)
    }

    fn request_consent(&self, capability: Capability) -> ConsentTicket {
        let mut state = self.inner.state.lock().unwrap();
        *state.consent_calls.entry(capability).or_insert(0) += 1;
        let script = state
            .scripts
            .get(&capability)
            .copied()
            .unwrap_or(ConsentScript::Grant);
        debug!("simulated {} consent request: {:?}", capability, script);
        match script {
            ConsentScript::Grant => ConsentTicket::resolved(ConsentOutcome::Granted),
            ConsentScript::Deny => ConsentTicket::resolved(ConsentOutcome::Denied),
            ConsentScript::Fault => {
                let (resolver, ticket) = ConsentTicket::pending();
                drop(resolver);
                ticket
            }
            ConsentScript::Manual => {
                let (resolver, ticket) = ConsentTicket::pending();
                state.pending.push((capability, resolver));
                ticket
            }
        }
    }

    fn register_listener(&self, capability: Capability, sink: Sender<RawEvent>) -> ListenerId {
        self.inner.registry.register(capability, sink)
    }

    fn deregister_listener(&self, id: ListenerId) {
        if self.inner.registry.deregister(id) {
            self.inner.state.lock().unwrap().deregistered.push(id);
        }
    }
}
