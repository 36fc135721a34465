//! 传感器平台边界：能力查询、权限协商与监听器管理
//!
//! 订阅状态机只通过 [`SensorPlatform`] 与宿主环境交互。后端负责
//! 上报能力支持程度、执行授权流程，并把原始事件投递给已注册的
//! 监听器。进程内测试与演示用 [`SimulatedPlatform`]，真实手机
//! 数据走 [`MqttPlatform`]。

pub mod mqtt;
pub mod registry;
pub mod simulator;

pub use mqtt::{BridgeError, MqttPlatform};
pub use registry::{ListenerId, ListenerRegistry};
pub use simulator::{ConsentScript, SimulatedPlatform};

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use serde::Serialize;

use crate::types::RawEvent;

/// 平台传感器能力类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// 设备运动（加速度）
    Motion,
    /// 设备姿态（旋转角）
    Orientation,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Motion => write!(f, "motion"),
            Capability::Orientation => write!(f, "orientation"),
        }
    }
}

/// 平台对某项能力的支持程度，在能力检查阶段查询
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySupport {
    /// 平台没有该传感器设施
    Unsupported,
    /// 支持且没有授权机制，视为隐式同意
    Supported,
    /// 支持但必须先完成一次授权协商
    RequiresConsent,
}

/// 授权协商的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentOutcome {
    Granted,
    Denied,
}

/// 一次授权请求的回执，由平台异步填充
///
/// 结果只能取走一次，调用方取到后须自行缓存。
#[derive(Debug)]
pub struct ConsentTicket {
    rx: Receiver<ConsentOutcome>,
}

/// 平台侧持有的回执填充端
///
/// 未填充就丢弃等价于授权调用失败，回执侧会把它当作拒绝。
#[derive(Debug)]
pub struct ConsentResolver {
    tx: Sender<ConsentOutcome>,
}

impl ConsentTicket {
    /// 创建一对挂起的回执与填充端
    pub fn pending() -> (ConsentResolver, ConsentTicket) {
        let (tx, rx) = bounded(1);
        (ConsentResolver { tx }, ConsentTicket { rx })
    }

    /// 创建已带结果的回执
    pub fn resolved(outcome: ConsentOutcome) -> ConsentTicket {
        let (tx, rx) = bounded(1);
        let _ = tx.send(outcome);
        ConsentTicket { rx }
    }

    /// 非阻塞地查询结果；填充端已消失而结果未送达时按拒绝处理
    pub fn try_outcome(&self) -> Option<ConsentOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(ConsentOutcome::Denied),
        }
    }
}

impl ConsentResolver {
    /// 填充协商结果
    pub fn resolve(self, outcome: ConsentOutcome) {
        let _ = self.tx.send(outcome);
    }
}

/// 传感器平台抽象
///
/// 实现者负责能力上报、授权流程与事件投递，且允许跨线程共享。
pub trait SensorPlatform: Send + Sync {
    /// 查询某项能力的支持程度
    fn capability(&self, capability: Capability) -> CapabilitySupport;

    /// 发起一次授权请求，结果经回执异步送达
    ///
    /// 只会对 `RequiresConsent` 的能力调用。
    fn request_consent(&self, capability: Capability) -> ConsentTicket;

    /// 注册事件监听器，平台此后把该能力的事件投递到 sink
    fn register_listener(&self, capability: Capability, sink: Sender<RawEvent>) -> ListenerId;

    /// 注销监听器；必须使用注册时返回的同一个句柄
    fn deregister_listener(&self, id: ListenerId);
}
