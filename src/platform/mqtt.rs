//! 通过 MQTT 桥接真实手机传感器数据的平台后端
//!
//! 手机端把运动与姿态事件以 JSON 分别发布到两个主题，工作线程
//! 解析后经注册表投递给订阅者。桥接没有用户授权环节，两项能力
//! 均按隐式同意上报。

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use dotenv::dotenv;
use log::{error, info, warn};
use rumqttc::{Client, ClientError, Connection, Event, LastWill, MqttOptions, Packet, QoS};

use crate::config::MqttConfig;
use crate::platform::{
    Capability, CapabilitySupport, ConsentOutcome, ConsentTicket, ListenerId, ListenerRegistry,
    SensorPlatform,
};
use crate::types::{MotionSample, OrientationSample, RawEvent};

/// 桥接建立阶段的错误
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("MQTT client error: {0}")]
    Client(#[from] ClientError),
}

/// MQTT 桥接平台
pub struct MqttPlatform {
    registry: Arc<ListenerRegistry>,
    client: Client,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MqttPlatform {
    /// 按配置连接 broker 并启动事件工作线程
    pub fn connect(config: &MqttConfig) -> Result<Self, BridgeError> {
        dotenv().ok(); // 加载 .env 文件

        let mut mqtt_options = MqttOptions::new(
            config.client_id.clone(),
            config.broker.clone(),
            config.port,
        );

        // 凭据可选，两个环境变量都配置时才启用
        if let (Ok(user), Ok(pass)) = (env::var("MQTT_USER"), env::var("MQTT_PASS")) {
            mqtt_options.set_credentials(user, pass);
        }

        let qos = qos_level(config.qos);
        mqtt_options
            .set_keep_alive(Duration::from_secs(config.keep_alive as u64))
            .set_last_will(LastWill::new(
                config.topics.motion.clone(),
                "offline",
                qos,
                false,
            ));

        let (client, connection) = Client::new(mqtt_options, 10);
        client.subscribe(config.topics.motion.clone(), qos)?;
        client.subscribe(config.topics.orientation.clone(), qos)?;

        let registry = Arc::new(ListenerRegistry::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker = thread::spawn({
            let registry = Arc::clone(&registry);
            let shutdown = Arc::clone(&shutdown);
            let motion_topic = config.topics.motion.clone();
            let orientation_topic = config.topics.orientation.clone();
            move || run_event_loop(connection, registry, shutdown, motion_topic, orientation_topic)
        });

        info!("MQTT bridge connected to {}:{}", config.broker, config.port);
        Ok(Self {
            registry,
            client,
            shutdown,
            worker: Some(worker),
        })
    }
}

impl SensorPlatform for MqttPlatform {
    fn capability(&self, _capability: Capability) -> CapabilitySupport {
        // 桥接转发两类事件，且没有授权交互界面
        CapabilitySupport::Supported
    }

    fn request_consent(&self, _capability: Capability) -> ConsentTicket {
        // Supported 能力不会走协商；到达这里也直接放行
        ConsentTicket::resolved(ConsentOutcome::Granted)
    }

    fn register_listener(&self, capability: Capability, sink: Sender<RawEvent>) -> ListenerId {
        self.registry.register(capability, sink)
    }

    fn deregister_listener(&self, id: ListenerId) {
        self.registry.deregister(id);
    }
}

impl Drop for MqttPlatform {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // 断开连接促使事件循环立即醒来并检查关闭信号
        if let Err(e) = self.client.disconnect() {
            warn!("MQTT disconnect failed: {}", e);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("MQTT worker thread panicked");
            } else {
                info!("MQTT worker exited gracefully");
            }
        }
    }
}

fn run_event_loop(
    mut connection: Connection,
    registry: Arc<ListenerRegistry>,
    shutdown: Arc<AtomicBool>,
    motion_topic: String,
    orientation_topic: String,
) {
    for event in connection.iter() {
        // 检查关闭信号
        if shutdown.load(Ordering::Relaxed) {
            info!("MQTT worker received shutdown signal, exiting gracefully");
            break;
        }

        match event {
            Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == motion_topic => {
                match parse_motion(&publish.payload) {
                    Ok(sample) => {
                        registry.dispatch(RawEvent::Motion(sample));
                    }
                    Err(e) => warn!("Invalid motion payload: {}", e),
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == orientation_topic => {
                match parse_orientation(&publish.payload) {
                    Ok(sample) => {
                        registry.dispatch(RawEvent::Orientation(sample));
                    }
                    Err(e) => warn!("Invalid orientation payload: {}", e),
                }
            }
            Ok(Event::Incoming(_)) => {}
            Err(e) => {
                error!("MQTT connection error: {}", e);
                // 等 rumqttc 自动重连，避免错误风暴
                thread::sleep(Duration::from_secs(1));
            }
            _ => {}
        }
    }
}

fn qos_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

fn parse_motion(payload: &[u8]) -> Result<MotionSample, String> {
    let payload_str = std::str::from_utf8(payload)
        .map_err(|e| format!("Invalid UTF-8: {}", e))?;

    serde_json::from_str::<MotionSample>(payload_str)
        .map_err(|e| format!("JSON parsing error: {}", e))
}

fn parse_orientation(payload: &[u8]) -> Result<OrientationSample, String> {
    let payload_str = std::str::from_utf8(payload)
        .map_err(|e| format!("Invalid UTF-8: {}", e))?;

    serde_json::from_str::<OrientationSample>(payload_str)
        .map_err(|e| format!("Orientation JSON parsing error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_payload_parses() {
        let sample = parse_motion(br#"{"x":0.12,"y":-0.3,"z":9.81,"timestamp":1700000000000}"#)
            .expect("valid payload");
        assert_eq!(sample.x, Some(0.12));
        assert_eq!(sample.z, Some(9.81));
        assert_eq!(sample.timestamp, 1700000000000);
    }

    #[test]
    fn orientation_payload_allows_missing_angles() {
        let sample = parse_orientation(br#"{"alpha":90.0,"timestamp":12}"#).expect("valid payload");
        assert_eq!(sample.alpha, Some(90.0));
        assert_eq!(sample.beta, None);
        assert_eq!(sample.gamma, None);
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(parse_motion(b"not json").is_err());
        assert!(parse_motion(&[0xff, 0xfe]).is_err());
        assert!(parse_orientation(br#"{"alpha":"east"}"#).is_err());
    }

    #[test]
    fn qos_levels_map_onto_protocol_constants() {
        assert_eq!(qos_level(0), QoS::AtMostOnce);
        assert_eq!(qos_level(1), QoS::AtLeastOnce);
        assert_eq!(qos_level(2), QoS::ExactlyOnce);
        assert_eq!(qos_level(9), QoS::AtLeastOnce);
    }
}
