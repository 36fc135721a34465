//! 核心数据类型：原始样本、事件载荷与合并快照

pub mod reading;
pub mod samples;

pub use reading::{AccelerometerReading, FeedError, Reading};
pub use samples::{MotionSample, OrientationSample, RawEvent};
