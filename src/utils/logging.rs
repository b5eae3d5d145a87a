// 日志系统模块

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志系统
/// 支持通过 RUST_LOG 环境变量控制日志级别，默认为 info
///
/// 日志写到 stderr，stdout 留给回放结果。
pub fn init_logging() -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| {
            let error_msg = format!("日志系统初始化失败: {}", e);
            eprintln!("{}", error_msg);
            error_msg
        })?;

    info!("Logging initialized");
    Ok(())
}
