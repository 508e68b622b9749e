//! 会话上下文
//!
//! 封装"我正在处理第几个访问码的第几次尝试"这一信息

use std::fmt::Display;

use crate::models::UserProfile;

/// 会话上下文
#[derive(Debug, Clone)]
pub struct SessionCtx {
    pub session_id: String,
    pub access_code: String,
    /// 访问码在批次中的位置（从1开始，仅用于日志）
    pub index: usize,
    pub total: usize,
    /// 批量层的第几次重试（首次为 0）
    pub attempt: u32,
    /// 本会话使用的用户资料
    pub profile: UserProfile,
}

impl SessionCtx {
    pub fn new(access_code: impl Into<String>, index: usize, total: usize, profile: UserProfile) -> Self {
        let access_code = access_code.into();
        Self {
            session_id: format!("{}-{}", access_code, chrono::Local::now().format("%H%M%S%3f")),
            access_code,
            index,
            total,
            attempt: 0,
            profile,
        }
    }

    /// 同一个访问码的下一次尝试，换一个新的会话 id
    pub fn retry(&self) -> Self {
        let mut next = Self::new(self.access_code.clone(), self.index, self.total, self.profile.clone());
        next.attempt = self.attempt + 1;
        next
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.attempt == 0 {
            write!(f, "[会话 {}/{} {}]", self.index, self.total, self.access_code)
        } else {
            write!(
                f,
                "[会话 {}/{} {} 重试#{}]",
                self.index, self.total, self.access_code, self.attempt
            )
        }
    }
}
