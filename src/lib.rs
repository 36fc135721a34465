//! Gyrotron：设备运动与姿态的传感器订阅库
//!
//! 把平台的高频原始传感器事件变成一个持续更新、可随时同步读取的
//! 合并快照 [`Reading`]。库负责能力检查、权限协商、双流合并、
//! 更新节流与干净的注销；宿主环境经 [`platform::SensorPlatform`]
//! 接入，自带 MQTT 桥接与进程内模拟两个后端。
//!
//! ```
//! use std::sync::Arc;
//! use gyrotron::platform::SimulatedPlatform;
//! use gyrotron::{FeedOptions, MotionFeed};
//!
//! let platform = Arc::new(SimulatedPlatform::new());
//! let mut feed = MotionFeed::subscribe(platform, FeedOptions::default());
//!
//! // 消费者在自己的循环里驱动状态机
//! feed.pump();
//! let reading = feed.reading();
//! assert!(reading.is_healthy());
//! ```

pub mod config;
pub mod feed;
pub mod logger;
pub mod platform;
pub mod types;
pub mod utils;

pub use feed::{
    AccelerometerFeed, ConsentProbe, FeedOptions, FeedPhase, MotionFeed, NegotiationStatus,
};
pub use types::{
    AccelerometerReading, FeedError, MotionSample, OrientationSample, RawEvent, Reading,
};
