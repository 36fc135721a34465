//! 权限协商：对单项能力执行一次平台授权握手
//!
//! 没有授权机制的能力按隐式同意处理。授权调用本身失败与被拒绝
//! 同样对待，不向调用方传播。

use log::{debug, info, warn};

use crate::platform::{Capability, CapabilitySupport, ConsentOutcome, ConsentTicket, SensorPlatform};

/// 单项能力协商的当前状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStatus {
    /// 等待平台异步返回结果
    Pending,
    Granted,
    Denied,
    /// 平台没有该能力，协商无从谈起
    Unsupported,
}

impl NegotiationStatus {
    /// 协商是否已有最终结果
    pub fn is_settled(&self) -> bool {
        !matches!(self, NegotiationStatus::Pending)
    }
}

#[derive(Debug)]
enum ProbeState {
    Waiting(ConsentTicket),
    Done(NegotiationStatus),
}

/// 一次独立的授权协商
///
/// 每个探针至多向平台发起一次授权调用；重新协商应创建新的探针。
#[derive(Debug)]
pub struct ConsentProbe {
    capability: Capability,
    state: ProbeState,
}

impl ConsentProbe {
    /// 按能力支持程度发起协商
    pub fn begin(platform: &dyn SensorPlatform, capability: Capability) -> Self {
        let state = match platform.capability(capability) {
            CapabilitySupport::Unsupported => {
                warn!("{} capability unavailable, negotiation aborted", capability);
                ProbeState::Done(NegotiationStatus::Unsupported)
            }
            CapabilitySupport::Supported => {
                // 无授权机制，隐式同意，不触发授权调用
                debug!("{} capability needs no consent, implicitly granted", capability);
                ProbeState::Done(NegotiationStatus::Granted)
            }
            CapabilitySupport::RequiresConsent => {
                debug!("requesting {} consent", capability);
                ProbeState::Waiting(platform.request_consent(capability))
            }
        };
        Self { capability, state }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// 查询协商进展，结果一旦确定即被缓存
    pub fn poll(&mut self) -> NegotiationStatus {
        if let ProbeState::Waiting(ticket) = &self.state {
            if let Some(outcome) = ticket.try_outcome() {
                let status = match outcome {
                    ConsentOutcome::Granted => NegotiationStatus::Granted,
                    ConsentOutcome::Denied => NegotiationStatus::Denied,
                };
                info!("{} consent resolved: {:?}", self.capability, status);
                self.state = ProbeState::Done(status);
            }
        }
        match &self.state {
            ProbeState::Waiting(_) => NegotiationStatus::Pending,
            ProbeState::Done(status) => *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ConsentScript, SimulatedPlatform};

    #[test]
    fn supported_capability_is_implicitly_granted() {
        let platform = SimulatedPlatform::new();
        let mut probe = ConsentProbe::begin(&platform, Capability::Motion);
        assert_eq!(probe.poll(), NegotiationStatus::Granted);
        // 隐式同意不触发任何授权调用
        assert_eq!(platform.consent_requests(Capability::Motion), 0);
    }

    #[test]
    fn unsupported_capability_skips_the_consent_call() {
        let platform = SimulatedPlatform::new();
        platform.set_support(Capability::Orientation, crate::platform::CapabilitySupport::Unsupported);
        let mut probe = ConsentProbe::begin(&platform, Capability::Orientation);
        assert_eq!(probe.poll(), NegotiationStatus::Unsupported);
        assert_eq!(platform.consent_requests(Capability::Orientation), 0);
    }

    #[test]
    fn consent_is_requested_exactly_once() {
        let platform = SimulatedPlatform::new();
        platform.script_consent(Capability::Motion, ConsentScript::Grant);
        let mut probe = ConsentProbe::begin(&platform, Capability::Motion);

        assert_eq!(probe.poll(), NegotiationStatus::Granted);
        assert_eq!(probe.poll(), NegotiationStatus::Granted);
        assert_eq!(platform.consent_requests(Capability::Motion), 1);
    }

    #[test]
    fn denial_settles_the_probe() {
        let platform = SimulatedPlatform::new();
        platform.script_consent(Capability::Motion, ConsentScript::Deny);
        let mut probe = ConsentProbe::begin(&platform, Capability::Motion);
        assert_eq!(probe.poll(), NegotiationStatus::Denied);
        assert!(probe.poll().is_settled());
    }

    #[test]
    fn faulted_consent_call_reads_as_denial() {
        let platform = SimulatedPlatform::new();
        platform.script_consent(Capability::Motion, ConsentScript::Fault);
        let mut probe = ConsentProbe::begin(&platform, Capability::Motion);
        assert_eq!(probe.poll(), NegotiationStatus::Denied);
    }

    #[test]
    fn manual_script_stays_pending_until_resolved() {
        let platform = SimulatedPlatform::new();
        platform.script_consent(Capability::Motion, ConsentScript::Manual);
        let mut probe = ConsentProbe::begin(&platform, Capability::Motion);

        assert_eq!(probe.poll(), NegotiationStatus::Pending);
        assert!(!probe.poll().is_settled());

        platform.resolve_consent(Capability::Motion, crate::platform::ConsentOutcome::Granted);
        assert_eq!(probe.poll(), NegotiationStatus::Granted);
    }
}
