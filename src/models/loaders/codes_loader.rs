use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

use crate::error::{AppError, AppResult};

/// 解析访问码列表：每行一个，忽略空行和 `#` 注释，去重并保持原顺序
pub fn parse_access_codes(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|code| seen.insert(code.to_string()))
        .map(str::to_string)
        .collect()
}

/// 从文件加载访问码
pub async fn load_access_codes(path: &Path) -> AppResult<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| AppError::CodesFile {
            path: path.display().to_string(),
            source,
        })?;

    let codes = parse_access_codes(&content);
    tracing::info!("✓ 从 {} 加载了 {} 个访问码", path.display(), codes.len());
    Ok(codes)
}
