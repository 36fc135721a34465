mod plotter;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use eframe::{egui, Frame};
use log::{error, info};
use rand::Rng;

use gyrotron::config::AppConfig;
use gyrotron::platform::{Capability, ConsentScript, MqttPlatform, SensorPlatform, SimulatedPlatform};
use gyrotron::{logger, utils, FeedOptions, FeedPhase, MotionFeed, MotionSample, OrientationSample, Reading};

fn main() {
    logger::init_logger();
    info!("Application starting");

    let config = match AppConfig::load_from_file("gyrotron.toml") {
        Ok(config) => config,
        Err(e) => {
            info!("No usable gyrotron.toml ({}), falling back to defaults", e);
            AppConfig::default()
        }
    };

    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let (platform, driver_handle): (Arc<dyn SensorPlatform>, Option<JoinHandle<()>>) =
        match config.source.kind.as_str() {
            "mqtt" => match MqttPlatform::connect(&config.mqtt) {
                Ok(platform) => (Arc::new(platform), None),
                Err(e) => {
                    error!("MQTT bridge failed: {}", e);
                    std::process::exit(1);
                }
            },
            _ => {
                let sim = SimulatedPlatform::new();
                let script = if config.source.simulate_denied {
                    ConsentScript::Deny
                } else {
                    ConsentScript::Grant
                };
                sim.script_consent(Capability::Motion, script);
                sim.script_consent(Capability::Orientation, script);
                let driver = spawn_sim_driver(sim.clone(), Arc::clone(&shutdown_signal));
                (Arc::new(sim), Some(driver))
            }
        };

    let viewer = FeedViewer::new(Arc::clone(&platform), &config);

    let options = eframe::NativeOptions {
        vsync: config.window.vsync,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        renderer: eframe::Renderer::Glow,
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_resizable(config.window.resizable),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        &config.window.title,
        options,
        Box::new(|_cc| Ok(Box::new(viewer))),
    ) {
        error!("GUI failed: {}", e);
        std::process::exit(1);
    }

    // GUI 关闭后，通知模拟数据源线程收尾
    info!("GUI closed, shutting down");
    shutdown_signal.store(true, Ordering::Relaxed);
    if let Some(handle) = driver_handle {
        if handle.join().is_err() {
            error!("Simulator driver thread panicked");
        }
    }
}

/// 模拟数据源：按传感器量级产生正弦运动和缓慢的姿态扫摆
fn spawn_sim_driver(platform: SimulatedPlatform, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = rand::rng();
        let started = std::time::Instant::now();
        let mut tick: u64 = 0;
        info!("模拟数据源启动");

        while !shutdown.load(Ordering::Relaxed) {
            let t = started.elapsed().as_secs_f64();
            let jitter = rng.random_range(-0.05..0.05);
            platform.emit_motion(MotionSample::new(
                (t * 1.3).sin() * 2.0 + jitter,
                (t * 0.9).cos() * 2.0 + jitter,
                9.81 + (t * 2.1).sin() * 0.3 + jitter,
                utils::now_ms(),
            ));

            // 姿态流的事件频率低于运动流
            if tick % 4 == 0 {
                platform.emit_orientation(OrientationSample::new(
                    (t * 12.0) % 360.0,
                    (t * 0.5).sin() * 40.0,
                    (t * 0.7).cos() * 25.0,
                    utils::now_ms(),
                ));
            }
            tick += 1;
            thread::sleep(Duration::from_millis(10));
        }
        info!("Simulator driver stopped");
    })
}

/// egui 查看器：驱动订阅并展示当前读数
struct FeedViewer {
    platform: Arc<dyn SensorPlatform>,
    feed_options: FeedOptions,
    feed: MotionFeed,
    trace: plotter::TracePlot,
    trace_window: f64,
    trace_height: f32,
    last_plotted_ms: i64,
}

impl FeedViewer {
    fn new(platform: Arc<dyn SensorPlatform>, config: &AppConfig) -> Self {
        let feed_options = config.feed_options();
        let feed = MotionFeed::subscribe(Arc::clone(&platform), feed_options.clone());
        Self {
            platform,
            feed_options,
            feed,
            trace: plotter::TracePlot::new(
                config.plot.window_duration_seconds,
                config.plot.plot_height,
            ),
            trace_window: config.plot.window_duration_seconds,
            trace_height: config.plot.plot_height,
            last_plotted_ms: 0,
        }
    }

    /// 重新订阅，权限被拒后的手动重试入口
    fn resubscribe(&mut self) {
        info!("Resubscribing at user request");
        self.feed = MotionFeed::subscribe(Arc::clone(&self.platform), self.feed_options.clone());
        self.trace = plotter::TracePlot::new(self.trace_window, self.trace_height);
        self.last_plotted_ms = 0;
    }
}

impl eframe::App for FeedViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // 设置明亮模式主题
        ctx.set_visuals(egui::Visuals::light());

        self.feed.pump();
        let reading = self.feed.reading();
        if reading.is_healthy() && reading.timestamp > self.last_plotted_ms {
            self.trace.push(&reading);
            self.last_plotted_ms = reading.timestamp;
        }

        // 顶部状态栏
        egui::TopBottomPanel::top("status_bar")
            .min_height(32.0)
            .show(ctx, |ui| {
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.label("Status:");
                    let (status_text, status_color) = match self.feed.phase() {
                        FeedPhase::Negotiating => ("Negotiating", egui::Color32::from_rgb(255, 165, 0)),
                        FeedPhase::Subscribed => ("Live", egui::Color32::from_rgb(0, 150, 0)),
                        FeedPhase::Errored => ("Error", egui::Color32::from_rgb(150, 0, 0)),
                        FeedPhase::Detached => ("Detached", egui::Color32::GRAY),
                    };
                    ui.colored_label(status_color, status_text);
                    ui.separator();
                    if reading.has_data() {
                        ui.label(format!(
                            "Last update: {}",
                            utils::format_timestamp(reading.timestamp)
                        ));
                    } else {
                        ui.label("waiting for data...");
                    }
                });
                ui.add_space(5.0);
            });

        // 主要内容区域
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = reading.error {
                ui.heading("Sensors unavailable");
                ui.colored_label(egui::Color32::from_rgb(150, 0, 0), error.to_string());
                ui.label("Grant sensor access on the device, then retry.");
                if ui.button("Re-request sensors").clicked() {
                    self.resubscribe();
                }
            } else {
                render_values(ui, &reading);
                ui.separator();
                self.trace.ui(ui);
            }
        });

        ctx.request_repaint_after(Duration::from_millis(33));
    }
}

/// 数值面板，未收到过数据的字段显示 N/A
fn render_values(ui: &mut egui::Ui, reading: &Reading) {
    fn fmt(value: Option<f64>) -> String {
        value.map_or_else(|| "N/A".to_string(), |v| format!("{:>7.2}", v))
    }

    egui::Grid::new("reading_values")
        .spacing([24.0, 4.0])
        .show(ui, |ui| {
            ui.label("Acceleration");
            ui.monospace(format!("x {}", fmt(reading.x)));
            ui.monospace(format!("y {}", fmt(reading.y)));
            ui.monospace(format!("z {}", fmt(reading.z)));
            ui.end_row();

            ui.label("Orientation");
            ui.monospace(format!("alpha {}", fmt(reading.alpha)));
            ui.monospace(format!("beta {}", fmt(reading.beta)));
            ui.monospace(format!("gamma {}", fmt(reading.gamma)));
            ui.end_row();
        });
}
