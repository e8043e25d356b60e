use std::fmt::Display;
use std::io::Write;

use log::Level;

/// 日志过滤的环境变量，写法与 RUST_LOG 相同，如 `warn` 或 `one_piece::tilemap=debug`
pub const LOG_ENV: &str = "ONE_PIECE_LOG";
const DEFAULT_FILTER: &str = "info";

fn format_record(level: Level, target: &str, message: impl Display) -> String {
    let now = chrono::Local::now().format("%H:%M:%S%.3f");
    format!("{} {:<5} {} - {}", now, level, target, message)
}

/// 安装 env_logger，重复调用时忽略
pub fn init() {
    let env = env_logger::Env::new().filter_or(LOG_ENV, DEFAULT_FILTER);
    let result = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(buf, "{}", format_record(record.level(), record.target(), record.args()))
        })
        .try_init();
    if result.is_err() {
        log::debug!("Logger already installed");
    }
}
