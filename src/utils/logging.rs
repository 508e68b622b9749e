/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use anyhow::{Context, Result};
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::models::BatchReport;

/// 初始化日志文件，写入带日期的文件头
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n问卷填写日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, scenarios: usize, codes: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 问卷自动填写");
    info!("📚 场景库: {} ({} 条)", config.scenario_file, scenarios);
    info!("🔑 访问码: {} 个", codes);
    info!(
        "🔁 重试上限: {} | ⏱ 会话间隔: {}s | 🎲 随机矩阵: {}",
        config.retry_bound,
        config.inter_session_delay_secs,
        if config.random_matrix { "开" } else { "关" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录单个访问码开始处理
pub fn log_session_start(index: usize, total: usize, access_code: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📋 开始处理第 {}/{} 个访问码: {}", index, total, access_code);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(report: &BatchReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.completed, report.total);
    info!("❌ 失败: {}", report.failed);
    if report.aborted > 0 {
        info!("⏹ 中止: {}", report.aborted);
    }
    info!("📈 成功率: {:.1}%", report.success_rate_percent);
    info!(
        "⏱ 总耗时: {:.1}s | 平均每份: {:.1}s",
        report.total_secs, report.average_session_secs
    );
    for (kind, count) in &report.failure_counts {
        info!("   {}: {}", kind, count);
    }

    let fuzzy: Vec<_> = report.fuzzy_matches().collect();
    if !fuzzy.is_empty() {
        info!("≈ 模糊匹配 {} 次，可考虑补充进场景库:", fuzzy.len());
        for audit in fuzzy {
            info!(
                "   '{}' → '{}' ({:.2})",
                truncate_text(&audit.page_text, 50),
                audit.matched_key,
                audit.score
            );
        }
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_text("Souhlasíte", 5), "Souhl...");
        assert_eq!(truncate_text("ano", 5), "ano");
    }
}
