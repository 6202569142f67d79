// RobotDashboard/src/main.rs

//! 仪表盘主程序（组合根）。
//!
//! ## 主要职责：
//! 1. 初始化日志系统 (`env_logger`)。
//! 2. 加载配置，创建唯一的 `ConnectionManager` 并注册配置中的话题。
//! 3. 接入状态栏与行驶控制两个消费者。
//! 4. 从标准输入读取操作员命令，直到 `quit` 或 Ctrl+C。
//! 5. 退出前关闭连接管理器。

use anyhow::{Context, Result};
use log::{error, info, warn, LevelFilter};
use robot_dashboard::api_client::ControlProxyClient;
use robot_dashboard::commands::{handle_line, CommandContext, CommandFlow, USAGE};
use robot_dashboard::config::DashboardConfig;
use robot_dashboard::consumers::{DriveControl, StatusBar};
use robot_dashboard::ws_client::topics::handler_for;
use robot_dashboard::ws_client::{ConnectionManager, ConnectionOptions};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    // 默认级别为 Info，可通过 RUST_LOG 覆盖
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init()
        .context("初始化 env_logger 日志服务失败")?;

    info!("[RobotDashboard] 仪表盘正在启动...");
    let config = DashboardConfig::load().context("加载仪表盘配置失败")?;

    let manager = ConnectionManager::new(ConnectionOptions::from(&config.bridge));
    for topic in &config.bridge.topics {
        match handler_for(topic) {
            Some(handler) => manager
                .subscribe(topic, handler)
                .await
                .with_context(|| format!("订阅话题 '{}' 失败", topic))?,
            None => warn!("[RobotDashboard] 话题 '{}' 没有内置解析器，已跳过", topic),
        }
    }

    let status_bar = StatusBar::attach(&manager).await;
    let drive = DriveControl::attach(&manager).await;
    let control_proxy = ControlProxyClient::new(config.control_proxy_url.clone())?;
    info!(
        "[RobotDashboard] 视频流: OPTICAL={} THERMAL={}",
        config.optical_stream_url, config.thermal_stream_url
    );

    let context = CommandContext { config, manager: manager.clone(), status_bar, drive, control_proxy };
    println!("{}", USAGE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match handle_line(&context, &line).await {
                    CommandFlow::Continue(text) if text.is_empty() => {}
                    CommandFlow::Continue(text) => println!("{}", text),
                    CommandFlow::Quit => break,
                },
                Ok(None) => {
                    info!("[RobotDashboard] 标准输入已关闭，按 Ctrl+C 退出");
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("[RobotDashboard] 等待 Ctrl+C 失败: {}", e);
                    }
                    break;
                }
                Err(e) => {
                    error!("[RobotDashboard] 读取标准输入失败: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("[RobotDashboard] 收到 Ctrl+C");
                break;
            }
        }
    }

    drop(context);
    manager.shutdown().await;
    info!("[RobotDashboard] 仪表盘已退出");
    Ok(())
}
