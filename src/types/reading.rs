use serde::Serialize;
use thiserror::Error;

use crate::platform::Capability;

/// 订阅的致命故障码
///
/// 写入 [`Reading::error`] 后对本次订阅保持不变，只有重新订阅才能清除。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
pub enum FeedError {
    /// 平台不具备该传感器能力
    #[error("{0} capability not supported on this platform")]
    CapabilityUnsupported(Capability),
    /// 权限被拒绝，或权限请求本身失败
    #[error("permission denied for motion/orientation")]
    PermissionDenied,
}

/// 合并后的对外快照：加速度三轴加姿态三角
///
/// None 表示该字段尚未收到任何数据。运动流与姿态流各自只更新
/// 自己的字段，另一组字段保留上一次的值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Reading {
    /// 加速度 x 轴，m/s²
    pub x: Option<f64>,
    /// 加速度 y 轴，m/s²
    pub y: Option<f64>,
    /// 加速度 z 轴，m/s²
    pub z: Option<f64>,
    /// 航向角，度
    pub alpha: Option<f64>,
    /// 俯仰角，度
    pub beta: Option<f64>,
    /// 横滚角，度
    pub gamma: Option<f64>,
    /// 最近一次合并的毫秒时间戳，0 表示从未更新
    pub timestamp: i64,
    /// 置位后订阅进入永久降级状态
    pub error: Option<FeedError>,
}

impl Reading {
    /// 订阅是否未发生致命故障
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }

    /// 是否已收到过至少一条传感器数据
    pub fn has_data(&self) -> bool {
        self.timestamp > 0
    }
}

/// 仅加速度计变体的对外快照
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct AccelerometerReading {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    /// 最近一次合并的毫秒时间戳，0 表示从未更新
    pub timestamp: i64,
    /// 置位后订阅进入永久降级状态
    pub error: Option<FeedError>,
}

impl From<Reading> for AccelerometerReading {
    fn from(reading: Reading) -> Self {
        Self {
            x: reading.x,
            y: reading.y,
            z: reading.z,
            timestamp: reading.timestamp,
            error: reading.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reading_is_empty_and_healthy() {
        let reading = Reading::default();
        assert_eq!(reading.x, None);
        assert_eq!(reading.alpha, None);
        assert_eq!(reading.timestamp, 0);
        assert!(reading.is_healthy());
        assert!(!reading.has_data());
    }

    #[test]
    fn accelerometer_projection_keeps_motion_fields() {
        let reading = Reading {
            x: Some(1.0),
            y: Some(2.0),
            z: Some(3.0),
            alpha: Some(90.0),
            timestamp: 42,
            ..Reading::default()
        };
        let projected = AccelerometerReading::from(reading);
        assert_eq!(projected.x, Some(1.0));
        assert_eq!(projected.y, Some(2.0));
        assert_eq!(projected.z, Some(3.0));
        assert_eq!(projected.timestamp, 42);
        assert_eq!(projected.error, None);
    }

    #[test]
    fn error_messages_name_the_cause() {
        let unsupported = FeedError::CapabilityUnsupported(Capability::Motion);
        assert_eq!(
            unsupported.to_string(),
            "motion capability not supported on this platform"
        );
        assert_eq!(
            FeedError::PermissionDenied.to_string(),
            "permission denied for motion/orientation"
        );
    }
}
