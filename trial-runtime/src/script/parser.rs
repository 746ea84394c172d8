//! # Script Parser 模块
//!
//! VN 脚本的行式解析器。
//!
//! ## 语法
//!
//! ```text
//! # 注释行
//! = bgm_court =
//! 审判长 "现在开庭。"
//! 旁白可以省略：
//! "法庭安静了下来。"
//! ```
//!
//! - `= name =`：演出标记
//! - `角色名 "台词"`：台词行，接受 ASCII 双引号、日式引号 「」、弯引号 “”
//! - 空行和 `#` 开头的行跳过
//! - 其余非空行是解析错误（带 1 起始行号）

use crate::error::ScriptError;
use crate::script::ast::{VnCommand, VnScript};

/// 支持的引号对（开引号, 闭引号）
const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('「', '」'), ('“', '”')];

/// 解析脚本文本
pub fn parse_script(text: &str) -> Result<VnScript, ScriptError> {
    let mut commands = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('=') {
            commands.push(parse_cue(rest, line_no)?);
            continue;
        }

        commands.push(parse_line(line, line_no)?);
    }

    Ok(VnScript::new(commands))
}

/// 解析演出标记行（已剥掉起始 `=`）
fn parse_cue(rest: &str, line_no: usize) -> Result<VnCommand, ScriptError> {
    let Some(inner) = rest.strip_suffix('=') else {
        return Err(ScriptError::InvalidLine {
            line: line_no,
            message: "演出标记缺少结尾的 '='".to_string(),
        });
    };

    let name = inner.trim();
    if name.is_empty() {
        return Err(ScriptError::InvalidLine {
            line: line_no,
            message: "演出标记名为空".to_string(),
        });
    }

    Ok(VnCommand::Cue {
        name: name.to_string(),
    })
}

/// 解析台词行
fn parse_line(line: &str, line_no: usize) -> Result<VnCommand, ScriptError> {
    // 找到最先出现的开引号
    let opening = line.char_indices().find_map(|(pos, c)| {
        QUOTE_PAIRS
            .iter()
            .find(|(open, _)| *open == c)
            .map(|(open, close)| (pos, *open, *close))
    });

    let Some((quote_pos, open, close)) = opening else {
        return Err(ScriptError::InvalidLine {
            line: line_no,
            message: "无法识别的行（缺少引号包裹的台词）".to_string(),
        });
    };

    let speaker = line[..quote_pos].trim();
    let body = &line[quote_pos + open.len_utf8()..];

    let Some(close_pos) = body.find(close) else {
        return Err(ScriptError::InvalidLine {
            line: line_no,
            message: "台词引号未闭合".to_string(),
        });
    };

    let text = &body[..close_pos];
    let trailing = &body[close_pos + close.len_utf8()..];
    if !trailing.trim().is_empty() {
        return Err(ScriptError::InvalidLine {
            line: line_no,
            message: "闭引号之后存在多余内容".to_string(),
        });
    }

    Ok(VnCommand::Line {
        speaker: if speaker.is_empty() {
            None
        } else {
            Some(speaker.to_string())
        },
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_script() {
        let text = r#"
# 开庭场景
= bgm_court =
审判长 "现在开庭。"
"法庭安静了下来。"
"#;
        let script = parse_script(text).unwrap();
        assert_eq!(
            script.commands,
            vec![
                VnCommand::Cue {
                    name: "bgm_court".to_string()
                },
                VnCommand::Line {
                    speaker: Some("审判长".to_string()),
                    text: "现在开庭。".to_string()
                },
                VnCommand::Line {
                    speaker: None,
                    text: "法庭安静了下来。".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_quote_variants() {
        let text = "Alice \"Hi\"\n成步堂「异议あり！」\n御剑 “冷静点。”";
        let script = parse_script(text).unwrap();
        assert_eq!(script.line_count(), 3);
        assert_eq!(
            script.commands[1],
            VnCommand::Line {
                speaker: Some("成步堂".to_string()),
                text: "异议あり！".to_string()
            }
        );
        assert_eq!(
            script.commands[2],
            VnCommand::Line {
                speaker: Some("御剑".to_string()),
                text: "冷静点。".to_string()
            }
        );
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        let script = parse_script("\n\n# 只有注释\n\n").unwrap();
        assert!(script.is_empty());
    }

    #[test]
    fn test_invalid_line_reports_line_number() {
        let text = "审判长 \"好的\"\n这行没有引号";
        let err = parse_script(text).unwrap_err();
        assert!(matches!(err, ScriptError::InvalidLine { line: 2, .. }));
    }

    #[test]
    fn test_unclosed_quote_is_error() {
        let err = parse_script("证人 「说到一半就").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidLine { line: 1, .. }));
    }

    #[test]
    fn test_trailing_garbage_is_error() {
        let err = parse_script("证人 \"完整台词\" 多余内容").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidLine { line: 1, .. }));
    }

    #[test]
    fn test_cue_requires_closing_equals() {
        assert!(parse_script("= flash").is_err());
        assert!(parse_script("= =").is_err());
        let script = parse_script("=  shake  =").unwrap();
        assert_eq!(
            script.commands[0],
            VnCommand::Cue {
                name: "shake".to_string()
            }
        );
    }
}
