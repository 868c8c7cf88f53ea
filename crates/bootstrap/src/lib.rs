//! 两个服务进程共用的启动工具：日志订阅器与停机信号。

use config::LogConfig;
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// 安装全局 tracing 订阅器，`RUST_LOG` 存在时覆盖配置中的级别。
pub fn init_tracing(log: &LogConfig) {
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter(log));
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn env_filter(log: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level))
}

/// 等待 Ctrl-C 或 SIGTERM。
///
/// 某个信号监听注册失败时只记录日志，继续等待另一个。
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig_term) => {
                sig_term.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
