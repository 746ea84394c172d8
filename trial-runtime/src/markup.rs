//! # Markup 模块
//!
//! 辩论台词内嵌的疑点标记子语言解析器。
//!
//! ## 语法
//!
//! ```text
//! 这句证言{sus:q1}有明显的矛盾{/sus}，不是吗？
//! ```
//!
//! span 之外的内容都是纯文本。解析输出有序的文本段列表、
//! 出现过的 span id 列表，以及去除标记后的纯文本。
//!
//! ## 失败语义
//!
//! 解析失败作为 `Err(MarkupError)` 返回给调用方，不向上传播；
//! 调用方应退回把整段输入当作纯文本处理。

use serde::{Deserialize, Serialize};

use crate::error::MarkupError;

const OPEN_TAG: &str = "{sus:";
const CLOSE_TAG: &str = "{/sus}";

/// 一段连续文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextRun {
    /// 纯文本段
    Plain(String),
    /// 疑点段（可被 `OpenSuspicion` 点开）
    Sus {
        /// span id（同一段文本内唯一）
        span_id: String,
        /// 段内可见文本
        text: String,
    },
}

impl TextRun {
    /// 段内可见文本
    pub fn text(&self) -> &str {
        match self {
            TextRun::Plain(t) => t,
            TextRun::Sus { text, .. } => text,
        }
    }
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupText {
    /// 有序文本段
    pub runs: Vec<TextRun>,
    /// 出现过的 span id（按出现顺序，无重复）
    pub span_ids: Vec<String>,
    /// 去除标记后的纯文本（空白/换行原样保留）
    pub plain: String,
}

impl MarkupText {
    /// 把整段输入当作纯文本包装（解析失败时的回退路径）
    pub fn plain_fallback(text: &str) -> Self {
        Self {
            runs: if text.is_empty() {
                Vec::new()
            } else {
                vec![TextRun::Plain(text.to_string())]
            },
            span_ids: Vec::new(),
            plain: text.to_string(),
        }
    }
}

/// 解析疑点标记
///
/// # 错误
///
/// 按检查顺序：未闭合标签、空 span id、span id 重复、嵌套标签。
pub fn parse_markup(input: &str) -> Result<MarkupText, MarkupError> {
    let mut runs = Vec::new();
    let mut span_ids: Vec<String> = Vec::new();
    let mut plain = String::new();
    let mut rest = input;

    while let Some(open_pos) = rest.find(OPEN_TAG) {
        // 标签前的纯文本段
        if open_pos > 0 {
            let head = &rest[..open_pos];
            plain.push_str(head);
            runs.push(TextRun::Plain(head.to_string()));
        }

        let after_open = &rest[open_pos + OPEN_TAG.len()..];

        // 开标签本身必须闭合
        let Some(id_end) = after_open.find('}') else {
            return Err(MarkupError::Unterminated);
        };
        let span_id = &after_open[..id_end];
        let body_and_rest = &after_open[id_end + 1..];

        // span 必须有对应的闭标签
        let Some(close_pos) = body_and_rest.find(CLOSE_TAG) else {
            return Err(MarkupError::Unterminated);
        };

        if span_id.is_empty() {
            return Err(MarkupError::EmptySpanId);
        }
        if span_ids.iter().any(|s| s == span_id) {
            return Err(MarkupError::DuplicateSpanId {
                span_id: span_id.to_string(),
            });
        }

        let body = &body_and_rest[..close_pos];
        if body.contains(OPEN_TAG) {
            return Err(MarkupError::NestedSpan {
                span_id: span_id.to_string(),
            });
        }

        plain.push_str(body);
        span_ids.push(span_id.to_string());
        runs.push(TextRun::Sus {
            span_id: span_id.to_string(),
            text: body.to_string(),
        });

        rest = &body_and_rest[close_pos + CLOSE_TAG.len()..];
    }

    // 末尾剩余的纯文本段
    if !rest.is_empty() {
        plain.push_str(rest);
        runs.push(TextRun::Plain(rest.to_string()));
    }

    Ok(MarkupText {
        runs,
        span_ids,
        plain,
    })
}
