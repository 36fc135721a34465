//! 仅加速度计的订阅变体

use std::sync::Arc;

use crate::feed::subscription::{FeedEngine, FeedOptions, FeedPhase};
use crate::platform::{Capability, SensorPlatform};
use crate::types::AccelerometerReading;

const REQUIRED: [Capability; 1] = [Capability::Motion];

/// 加速度计订阅
///
/// 只要求 motion 能力，平台缺失姿态能力与否不影响它。
/// 使用方式与 [`MotionFeed`](crate::feed::MotionFeed) 一致。
pub struct AccelerometerFeed {
    engine: FeedEngine,
}

impl AccelerometerFeed {
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

    /// 当前快照，只含加速度字段
    pub fn reading(&self) -> AccelerometerReading {
        self.engine.reading().into()
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
