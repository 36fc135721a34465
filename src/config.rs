use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::feed::FeedOptions;

/// 应用配置管理模块
/// 集中管理所有配置项，提供默认值和配置验证

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub source: SourceConfig,
    pub mqtt: MqttConfig,
    pub feed: FeedConfig,
    pub plot: PlotConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
    pub resizable: bool,
    pub vsync: bool,
}

/// 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// "simulator" 或 "mqtt"
    pub kind: String,
    /// 模拟平台演示拒绝授权的流程
    pub simulate_denied: bool,
}

/// MQTT配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub topics: MqttTopics,
    pub qos: u8,
    pub keep_alive: u16,
}

/// MQTT主题配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttTopics {
    pub motion: String,
    pub orientation: String,
}

/// 订阅参数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// 对外快照更新间隔（毫秒）
    pub update_interval_ms: u64,
    /// 原始事件缓冲容量
    pub event_buffer: usize,
}

/// 绘图配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    pub window_duration_seconds: f64,
    pub plot_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            source: SourceConfig::default(),
            mqtt: MqttConfig::default(),
            feed: FeedConfig::default(),
            plot: PlotConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1100.0,
            height: 760.0,
            title: "Gyrotron - Motion Feed Viewer".to_string(),
            resizable: true,
            vsync: true,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: "simulator".to_string(),
            simulate_denied: false,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: "localhost".to_string(),
            port: 1883,
            client_id: "gyrotron_viewer".to_string(),
            topics: MqttTopics::default(),
            qos: 1,
            keep_alive: 5,
        }
    }
}

impl Default for MqttTopics {
    fn default() -> Self {
        Self {
            motion: "sensor/motion".to_string(),
            orientation: "sensor/orientation".to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 100,
            event_buffer: 1024,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            window_duration_seconds: 10.0,
            plot_height: 160.0,
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(e))?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::IoError(e))?;

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return Err(ConfigError::ValidationError("Window dimensions must be positive".to_string()));
        }

        if self.source.kind != "simulator" && self.source.kind != "mqtt" {
            return Err(ConfigError::ValidationError(format!(
                "Unknown source kind: {}",
                self.source.kind
            )));
        }

        if self.feed.event_buffer == 0 {
            return Err(ConfigError::ValidationError("Event buffer capacity must be positive".to_string()));
        }

        if self.mqtt.qos > 2 {
            return Err(ConfigError::ValidationError("MQTT QoS must be 0, 1 or 2".to_string()));
        }

        if self.plot.window_duration_seconds <= 0.0 {
            return Err(ConfigError::ValidationError("Plot window must be positive".to_string()));
        }

        Ok(())
    }

    /// 转换为订阅参数
    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            update_interval: Duration::from_millis(self.feed.update_interval_ms),
            event_buffer: self.feed.event_buffer,
        }
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn unknown_source_kind_is_rejected() {
        let mut config = AppConfig::default();
        config.source.kind = "bluetooth".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_event_buffer_is_rejected() {
        let mut config = AppConfig::default();
        config.feed.event_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_survives_a_toml_round_trip() {
        let serialized = toml::to_string_pretty(&AppConfig::default()).expect("serializes");
        let parsed: AppConfig = toml::from_str(&serialized).expect("parses");
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.mqtt.topics.motion, "sensor/motion");
        assert_eq!(parsed.feed.update_interval_ms, 100);
        assert_eq!(parsed.source.kind, "simulator");
    }

    #[test]
    fn feed_options_carry_the_configured_interval() {
        let mut config = AppConfig::default();
        config.feed.update_interval_ms = 250;
        let options = config.feed_options();
        assert_eq!(options.update_interval, Duration::from_millis(250));
        assert_eq!(options.event_buffer, 1024);
    }
}
