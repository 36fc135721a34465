use serde::{Deserialize, Serialize};

use crate::platform::Capability;

/// 运动流的原始样本：设备坐标系下的加速度三轴，单位 m/s²
///
/// 字段为 None 表示数据源在本条事件中未上报该轴。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    /// 数据源侧的毫秒时间戳
    pub timestamp: i64,
}

impl MotionSample {
    /// 创建三轴齐全的样本
    pub fn new(x: f64, y: f64, z: f64, timestamp: i64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
            timestamp,
        }
    }
}

/// 姿态流的原始样本：alpha 航向角、beta 俯仰角、gamma 横滚角，单位度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    /// 航向角，[0, 360)
    #[serde(default)]
    pub alpha: Option<f64>,
    /// 俯仰角，[-180, 180)
    #[serde(default)]
    pub beta: Option<f64>,
    /// 横滚角，[-90, 90)
    #[serde(default)]
    pub gamma: Option<f64>,
    /// 数据源侧的毫秒时间戳
    pub timestamp: i64,
}

impl OrientationSample {
    /// 创建三角齐全的样本
    pub fn new(alpha: f64, beta: f64, gamma: f64, timestamp: i64) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
            timestamp,
        }
    }
}

/// 平台监听器投递给订阅通道的事件载荷
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent {
    Motion(MotionSample),
    Orientation(OrientationSample),
}

impl RawEvent {
    /// 事件所属的能力类别
    pub fn capability(&self) -> Capability {
        match self {
            RawEvent::Motion(_) => Capability::Motion,
            RawEvent::Orientation(_) => Capability::Orientation,
        }
    }
}
