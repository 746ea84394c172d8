//! # Script AST 模块
//!
//! VN 脚本解析后的结构化表示。VnRunner 按顺序消费这些命令。

use serde::{Deserialize, Serialize};

/// 脚本命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VnCommand {
    /// 一句台词
    ///
    /// 对应 `角色名 "台词内容"` 行（`None` 表示旁白）
    Line {
        /// 说话者
        speaker: Option<String>,
        /// 台词全文
        text: String,
    },

    /// 演出标记
    ///
    /// 对应 `= name =` 行。播放时原样转发给宿主的演出回调，
    /// 不计入台词。
    Cue {
        /// 演出名称
        name: String,
    },
}

impl VnCommand {
    /// 是否为台词
    pub fn is_line(&self) -> bool {
        matches!(self, Self::Line { .. })
    }
}

/// 解析后的 VN 脚本
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnScript {
    /// 命令列表（文件内顺序）
    pub commands: Vec<VnCommand>,
}

impl VnScript {
    /// 创建脚本
    pub fn new(commands: Vec<VnCommand>) -> Self {
        Self { commands }
    }

    /// 命令总数
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// 台词数量（不含演出标记）
    pub fn line_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_line()).count()
    }
}
