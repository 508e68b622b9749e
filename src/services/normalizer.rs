//! 文本规范化
//!
//! 把原始题干文本转换为稳定的问题键：去掉首尾空白，合并连续空白，
//! 按 Unicode 规则转小写（保留变音符号），去掉首尾标点。

/// 排版时混进来的不可见字符
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

/// 规范化题干文本，结果是幂等的：`normalize(normalize(x)) == normalize(x)`
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !is_invisible(*c)).collect();
    let collapsed = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}
