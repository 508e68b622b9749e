use std::path::Path;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::BrowserSettings;
use crate::error::ControlError;

/// 一个独立的浏览器进程
///
/// 每个会话使用全新的临时用户目录，Cookie 和本地存储互不影响；
/// 目录在结构体释放时删除
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
    pub profile_dir: TempDir,
}

/// 启动一个干净的浏览器
pub async fn launch_clean_browser(settings: &BrowserSettings) -> Result<LaunchedBrowser, ControlError> {
    info!(
        "🚀 启动浏览器 ({})...",
        if settings.headless { "无头模式" } else { "可见窗口" }
    );

    let profile_dir = tempfile::Builder::new()
        .prefix("survey-autofill-")
        .tempdir()
        .map_err(|e| ControlError::ContextSetup(format!("创建临时用户目录失败: {}", e)))?;
    debug!("临时用户目录: {}", profile_dir.path().display());

    let mut builder = BrowserConfig::builder()
        .user_data_dir(profile_dir.path())
        .window_size(settings.window_width, settings.window_height)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--no-first-run",
            "--no-default-browser-check",
        ]);
    builder = if settings.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &settings.chrome_executable {
        builder = builder.chrome_executable(Path::new(executable));
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        ControlError::ContextSetup(format!("配置浏览器失败: {}", e))
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        ControlError::ContextSetup(format!("启动浏览器失败: {}", e))
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    Ok(LaunchedBrowser {
        browser,
        handler,
        profile_dir,
    })
}
