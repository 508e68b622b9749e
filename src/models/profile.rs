//! 用户资料：输入框填写时引用的字段（出生年份等）

use serde::Serialize;
use std::collections::BTreeMap;

/// 单个会话使用的用户资料，会话开始时解析一次
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    values: BTreeMap<String, String>,
}

impl UserProfile {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 替换模板中的 `{field}` 占位符
    ///
    /// 任一字段缺失时返回缺失的字段名；没有闭合的 `{` 原样保留
    pub fn render(&self, template: &str) -> Result<String, String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let field = &after[..end];
            match self.get(field) {
                Some(value) => out.push_str(value),
                None => return Err(field.to_string()),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
