//! 运动与姿态的组合订阅

use std::sync::Arc;

use crate::feed::subscription::{FeedEngine, FeedOptions, FeedPhase};
use crate::platform::{Capability, SensorPlatform};
use crate::types::Reading;

const REQUIRED: [Capability; 2] = [Capability::Motion, Capability::Orientation];

/// 设备运动与姿态的组合订阅
///
/// 创建即开始能力检查与权限协商。消费者在自己的循环里调用
/// [`pump`](MotionFeed::pump) 驱动状态机，用 [`reading`](MotionFeed::reading)
/// 随时读取当前快照。drop 时自动注销监听器。
pub struct MotionFeed {
    engine: FeedEngine,
}

impl MotionFeed {
    /// 开始订阅
    pub fn subscribe(platform: Arc<dyn SensorPlatform>, options: FeedOptions) -> Self {
        Self {
            engine: FeedEngine::open(platform, &REQUIRED, options),
        }
    }

    /// 推进状态机并消化已到达的事件
    pub fn pump(&mut self) {
        self.engine.pump();
    }

    /// 当前合并快照
    pub fn reading(&self) -> Reading {
        self.engine.reading()
    }

    /// 订阅所处阶段
    pub fn phase(&self) -> FeedPhase {
        self.engine.phase()
    }

    /// 主动注销，之后订阅保持 Detached
    pub fn detach(&mut self) {
        self.engine.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::platform::SimulatedPlatform;
    use crate::types::{MotionSample, OrientationSample};

    fn instant_options() -> FeedOptions {
        FeedOptions {
            update_interval: Duration::ZERO,
            ..FeedOptions::default()
        }
    }

    #[test]
    fn feed_goes_live_on_a_consent_free_platform() {
        let platform = SimulatedPlatform::new();
        let feed = MotionFeed::subscribe(Arc::new(platform.clone()), FeedOptions::default());
        assert_eq!(feed.phase(), FeedPhase::Subscribed);
        assert_eq!(platform.listener_count(), 2);
    }

    #[test]
    fn both_streams_feed_one_reading() {
        let platform = SimulatedPlatform::new();
        let mut feed = MotionFeed::subscribe(Arc::new(platform.clone()), instant_options());

        platform.emit_motion(MotionSample::new(0.5, -0.5, 9.8, 1));
        feed.pump();
        platform.emit_orientation(OrientationSample::new(180.0, 10.0, -5.0, 2));
        feed.pump();

        let reading = feed.reading();
        assert_eq!(reading.x, Some(0.5));
        assert_eq!(reading.alpha, Some(180.0));
        assert!(reading.has_data());
    }

    #[test]
    fn detach_is_idempotent_and_final() {
        let platform = SimulatedPlatform::new();
        let mut feed = MotionFeed::subscribe(Arc::new(platform.clone()), instant_options());

        feed.detach();
        feed.detach();
        assert_eq!(feed.phase(), FeedPhase::Detached);
        assert_eq!(platform.listener_count(), 0);

        platform.emit_motion(MotionSample::new(1.0, 1.0, 1.0, 3));
        feed.pump();
        assert!(!feed.reading().has_data());
    }
}
