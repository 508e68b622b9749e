use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use crate::error::StoreError;
use crate::models::scenario::StrategyDescriptor;
use crate::models::store::ScenarioStore;

/// 场景文件中的一条记录
///
/// ```toml
/// [[scenario]]
/// question = "Souhlasíte s tvrzením?"
/// action_type = "matrix_fixed"
/// parameters = { rating = "A6" }
/// ```
#[derive(Debug, Deserialize)]
pub struct ScenarioEntry {
    pub question: String,
    #[serde(flatten)]
    pub descriptor: StrategyDescriptor,
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default, rename = "scenario")]
    scenarios: Vec<ScenarioEntry>,
}

/// 解析场景文本，`.json` 按 JSON 解析，其余按 TOML
pub fn parse_scenarios(content: &str, path: &Path) -> Result<ScenarioStore, StoreError> {
    let display = path.display().to_string();
    let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");

    let file: ScenarioFile = if is_json {
        serde_json::from_str(content).map_err(|e| StoreError::ParseFailed {
            path: display.clone(),
            message: e.to_string(),
        })?
    } else {
        toml::from_str(content).map_err(|e| StoreError::ParseFailed {
            path: display.clone(),
            message: e.to_string(),
        })?
    };

    ScenarioStore::from_entries(
        file.scenarios
            .into_iter()
            .map(|entry| (entry.question, entry.descriptor)),
    )
}

/// 从文件加载场景库（每次运行只加载一次）
pub async fn load_scenario_store(path: &Path) -> Result<ScenarioStore, StoreError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| StoreError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

    let store = parse_scenarios(&content, path)?;
    tracing::info!("✓ 从 {} 加载了 {} 个场景", path.display(), store.len());
    Ok(store)
}
