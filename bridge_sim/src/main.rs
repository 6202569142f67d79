// bridge_sim/src/main.rs

use anyhow::{Context, Result};
use bridge_sim::config::SimConfig;
use log::{info, LevelFilter};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志记录器
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
    info!("[主程序] 日志系统已初始化 (env_logger)，默认级别: Info。");

    let config = SimConfig::load().context("加载模拟服务配置失败")?;
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("绑定监听地址 {} 失败", addr))?;
    info!("[主程序] 模拟桥接服务已在 ws://{} 上启动", addr);

    tokio::select! {
        result = bridge_sim::serve(listener, config) => result.context("模拟桥接服务异常退出")?,
        _ = tokio::signal::ctrl_c() => info!("[主程序] 收到 Ctrl+C，正在退出"),
    }
    Ok(())
}
