//! 场景库：问题键 → 策略描述符
//!
//! 只在加载时写入，回放期间只读，可以在会话之间直接共享引用

use std::collections::HashMap;

use crate::error::StoreError;
use crate::models::scenario::StrategyDescriptor;
use crate::services::normalizer::normalize;

#[derive(Debug, Clone, Default)]
pub struct ScenarioStore {
    entries: HashMap<String, StrategyDescriptor>,
}

impl ScenarioStore {
    /// 由 (原始问题文本, 描述符) 构建场景库
    ///
    /// 问题文本会先规范化；规范化后重复或为空的键、参数不合法的描述符都会导致失败
    pub fn from_entries<I, S>(entries: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (S, StrategyDescriptor)>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (question, descriptor) in entries {
            let question = question.as_ref();
            descriptor.validate(question)?;

            let key = normalize(question);
            if key.is_empty() {
                return Err(StoreError::EmptyKey {
                    question: question.to_string(),
                });
            }
            if map.contains_key(&key) {
                return Err(StoreError::DuplicateKey { key });
            }
            map.insert(key, descriptor);
        }
        Ok(Self { entries: map })
    }

    /// 精确查找（参数必须是已经规范化的键）
    pub fn get(&self, key: &str) -> Option<&StrategyDescriptor> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StrategyDescriptor)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
