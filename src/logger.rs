use chrono::Local;
use env_logger::Builder;
use log::Level;
use std::io::Write;

/// 初始化带颜色的日志输出，默认级别 info
pub fn init_logger() {
    Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let time = Local::now().format("%H:%M:%S%.3f");
            let level_color = match record.level() {
                Level::Error => "\x1b[31m", // 红色
                Level::Warn => "\x1b[33m",  // 黄色
                Level::Info => "\x1b[32m",  // 绿色
                Level::Debug => "\x1b[36m", // 青色
                Level::Trace => "\x1b[90m", // 灰色
            };
            writeln!(
                buf,
                "{} {}{:<5}\x1b[0m [{}] {}",
                time,
                level_color,
                record.level(),
                record.target(),
                record.args(),
            )
        })
        .init();
}
