use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use lead_rotation::{Application, ShutdownManager};
use rotation_core::AppConfig;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("lead-rotation")
        .version(env!("CARGO_PKG_VERSION"))
        .about("线索轮询分配服务")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径（缺省时按默认路径查找）")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"])
                .global(true),
        )
        .subcommand(Command::new("serve").about("启动HTTP服务（默认）"))
        .subcommand(Command::new("migrate").about("运行数据库迁移后退出"))
        .subcommand(
            Command::new("reset")
                .about("重置轮询周期")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help("无条件把所有经销商标记为可用")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("dealers").about("列出经销商池及当前状态"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let config = AppConfig::load(config_path).context("加载配置失败")?;

    let log_level = matches
        .get_one::<String>("log-level")
        .unwrap_or(&config.observability.log_level)
        .clone();
    let log_format = matches
        .get_one::<String>("log-format")
        .unwrap_or(&config.observability.log_format)
        .clone();
    init_logging(&log_level, &log_format)?;

    match matches.subcommand() {
        Some(("migrate", _)) => run_migrate(config).await,
        Some(("reset", sub)) => run_reset(config, sub).await,
        Some(("dealers", _)) => run_dealers(config).await,
        _ => run_server(config).await,
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    info!("启动线索轮询分配服务");

    let shutdown_grace = Duration::from_secs(config.api.shutdown_timeout_seconds);
    let app = Arc::new(Application::new(config).await?);
    let shutdown_manager = ShutdownManager::new();

    let mut app_handle = {
        let app = Arc::clone(&app);
        let shutdown_rx = shutdown_manager.subscribe().await;

        tokio::spawn(async move {
            if let Err(e) = app.run(shutdown_rx).await {
                error!("应用运行失败: {e:#}");
            }
        })
    };

    let finished_early = tokio::select! {
        _ = wait_for_shutdown_signal() => false,
        result = &mut app_handle => {
            if let Err(e) = result {
                error!("应用任务异常结束: {e}");
            }
            true
        }
    };

    if finished_early {
        warn!("应用提前退出");
    } else {
        info!("收到关闭信号，开始优雅关闭...");
        shutdown_manager.shutdown().await;

        // 服务器自身按 shutdown_timeout_seconds 限时，这里额外留出余量
        match tokio::time::timeout(shutdown_grace + Duration::from_secs(5), app_handle).await {
            Ok(Ok(())) => info!("应用已优雅关闭"),
            Ok(Err(e)) => error!("应用关闭时发生错误: {e}"),
            Err(_) => warn!("应用关闭超时，强制退出"),
        }
    }

    app.close().await;
    info!("线索轮询分配服务已退出");
    Ok(())
}

async fn run_migrate(mut config: AppConfig) -> Result<()> {
    config.database.run_migrations = false;
    let app = Application::new(config).await?;
    app.migrate().await?;
    app.close().await;
    Ok(())
}

async fn run_reset(config: AppConfig, matches: &ArgMatches) -> Result<()> {
    let force = matches.get_flag("force");
    let app = Application::new(config).await?;
    let reset_count = app.reset_rotation(force).await?;
    println!("已重置 {reset_count} 个经销商");
    app.close().await;
    Ok(())
}

async fn run_dealers(config: AppConfig) -> Result<()> {
    let app = Application::new(config).await?;
    let dealers = app.list_dealers().await?;

    println!("{:<6} {:<24} {:<32} {}", "位置", "ID", "名称", "可用");
    for dealer in &dealers {
        println!(
            "{:<6} {:<24} {:<32} {}",
            dealer.pool_position,
            dealer.id,
            dealer.display_name,
            if dealer.available { "是" } else { "否" }
        );
    }
    println!("共 {} 个经销商", dealers.len());

    app.close().await;
    Ok(())
}

/// 初始化日志系统，RUST_LOG 优先于命令行和配置
fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 等待关闭信号
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_reset_force_flag() {
        let matches = cli()
            .try_get_matches_from(["lead-rotation", "reset", "--force", "-l", "debug"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "reset");
        assert!(sub.get_flag("force"));
        assert_eq!(
            matches.get_one::<String>("log-level").map(String::as_str),
            Some("debug")
        );
    }

    #[test]
    fn test_serve_is_default() {
        let matches = cli().try_get_matches_from(["lead-rotation"]).unwrap();
        assert!(matches.subcommand().is_none());
    }
}
