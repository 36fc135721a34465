use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};
use std::collections::VecDeque;

use gyrotron::Reading;

/// 最近一段时间合并快照的滚动曲线
///
/// 横轴为相对时间（秒），只保留窗口长度内的快照。
pub struct TracePlot {
    window_seconds: f64,
    plot_height: f32,
    origin_ms: Option<i64>,
    samples: VecDeque<(f64, Reading)>,
}

impl TracePlot {
    pub fn new(window_seconds: f64, plot_height: f32) -> Self {
        Self {
            window_seconds,
            plot_height,
            origin_ms: None,
            samples: VecDeque::new(),
        }
    }

    /// 记录一条新快照；调用方保证时间戳相对上一条已前进
    pub fn push(&mut self, reading: &Reading) {
        let origin = *self.origin_ms.get_or_insert(reading.timestamp);
        let t = (reading.timestamp - origin) as f64 / 1000.0;
        self.samples.push_back((t, *reading));

        // 移除滑出窗口的旧数据
        while let Some(&(oldest, _)) = self.samples.front() {
            if t - oldest > self.window_seconds {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn ui(&self, ui: &mut egui::Ui) {
        if self.samples.is_empty() {
            ui.label("Waiting for data...");
            return;
        }

        ui.heading("Acceleration (m/s²)");
        self.plot_group(
            ui,
            "acceleration_trace",
            &[
                ("x", Color32::from_rgb(255, 0, 0), self.series(|r| r.x)),
                ("y", Color32::from_rgb(0, 180, 0), self.series(|r| r.y)),
                ("z", Color32::from_rgb(0, 0, 255), self.series(|r| r.z)),
            ],
        );

        ui.separator();

        ui.heading("Orientation (deg)");
        self.plot_group(
            ui,
            "orientation_trace",
            &[
                ("alpha", Color32::from_rgb(230, 120, 0), self.series(|r| r.alpha)),
                ("beta", Color32::from_rgb(140, 0, 180), self.series(|r| r.beta)),
                ("gamma", Color32::from_rgb(0, 150, 150), self.series(|r| r.gamma)),
            ],
        );
    }

    /// 抽取单个字段的时间序列，None 的时段直接跳过
    fn series(&self, pick: impl Fn(&Reading) -> Option<f64>) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .filter_map(|(t, reading)| pick(reading).map(|v| [*t, v]))
            .collect()
    }

    fn plot_group(&self, ui: &mut egui::Ui, id: &str, series: &[(&str, Color32, Vec<[f64; 2]>)]) {
        // 动态 y 轴范围覆盖组内全部曲线
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for (_, _, points) in series {
            for point in points {
                y_min = y_min.min(point[1]);
                y_max = y_max.max(point[1]);
            }
        }
        if !y_min.is_finite() {
            ui.label("No samples on this stream yet");
            return;
        }

        let range = (y_max - y_min).max(0.1);
        let y_min = y_min - range * 0.05;
        let y_max = y_max + range * 0.05;

        let newest = self.samples.back().map(|(t, _)| *t).unwrap_or(0.0);
        let x_max = newest.max(self.window_seconds);
        let x_min = x_max - self.window_seconds;

        Plot::new(id)
            .height(self.plot_height)
            .legend(Legend::default())
            .x_axis_formatter(|v, _| format!("{:.1}s", v.value))
            .allow_drag(false)
            .allow_zoom(false)
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max([x_min, y_min], [x_max, y_max]));
                for (name, color, points) in series {
                    if points.is_empty() {
                        continue;
                    }
                    plot_ui.line(
                        Line::new(*name, PlotPoints::from(points.clone()))
                            .color(*color)
                            .width(1.0),
                    );
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading_at(ms: i64, x: f64) -> Reading {
        Reading {
            x: Some(x),
            timestamp: ms,
            ..Reading::default()
        }
    }

    #[test]
    fn old_samples_slide_out_of_the_window() {
        let mut plot = TracePlot::new(10.0, 160.0);
        for s in 0..16 {
            plot.push(&reading_at(s * 1000, s as f64));
        }
        // 15 秒的跨度里窗口只保留最后 10 秒
        assert!(plot.sample_count() <= 11);
        let oldest = plot.samples.front().map(|(t, _)| *t).unwrap_or(0.0);
        let newest = plot.samples.back().map(|(t, _)| *t).unwrap_or(0.0);
        assert!(newest - oldest <= 10.0);
    }

    #[test]
    fn series_skips_fields_that_were_never_reported() {
        let mut plot = TracePlot::new(10.0, 160.0);
        plot.push(&reading_at(0, 1.0));
        plot.push(&reading_at(1000, 2.0));

        assert_eq!(plot.series(|r| r.x).len(), 2);
        assert!(plot.series(|r| r.alpha).is_empty());
    }
}
