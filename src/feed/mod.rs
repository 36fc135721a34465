//! 订阅核心：权限协商、双流合并、节流与生命周期管理

pub mod accelerometer;
pub mod consent;
mod merger;
pub mod motion;
pub mod subscription;
pub mod throttle;

pub use accelerometer::AccelerometerFeed;
pub use consent::{ConsentProbe, NegotiationStatus};
pub use motion::MotionFeed;
pub use subscription::{FeedOptions, FeedPhase};
pub use throttle::ThrottleGate;
