//! # VnRunner 模块
//!
//! VN 台词播放状态机：逐字显示、演出标记透传、脚本耗尽后发出
//! Auto 事件。
//!
//! ## 显示模型
//!
//! 显示进度以 **Unicode 标量个数**计量（不是字节数）。
//! 每次 `advance` 要么显示一个字符，要么在整句显示完后切到下一句。
//! 演出标记（Cue）在换句时原样转发给演出回调，不计入台词。

use tracing::debug;

use crate::graph::GraphEvent;
use crate::script::{VnCommand, VnScript};

/// VN 播放状态机
#[derive(Debug)]
pub struct VnRunner {
    /// 命令列表
    commands: Vec<VnCommand>,
    /// 当前命令下标（指向当前台词；等于命令总数表示耗尽）
    cursor: usize,
    /// 当前说话者
    speaker: Option<String>,
    /// 当前台词全文
    text: String,
    /// 已显示的字符数（Unicode 标量）
    reveal: usize,
    /// 当前台词总字符数
    total: usize,
    /// 当前台词是否已显示完
    line_done: bool,
    /// 脚本是否已播放完
    finished: bool,
    /// 台词序号（每载入一句新台词递增；VnAutoTimer 的重装 key）
    line_serial: u64,
}

impl VnRunner {
    /// 进入节点：从脚本重建全部状态
    ///
    /// 第一句台词之前的演出标记会在此时依次触发。
    pub fn enter(script: VnScript, cues: &mut dyn FnMut(&str)) -> Self {
        let mut runner = Self {
            commands: script.commands,
            cursor: 0,
            speaker: None,
            text: String::new(),
            reveal: 0,
            total: 0,
            line_done: false,
            finished: false,
            line_serial: 0,
        };
        if !runner.seek_line(cues) {
            runner.finished = true;
        }
        runner
    }

    /// 从 `cursor` 起扫描到下一句台词
    ///
    /// 沿途的演出标记立即触发。找到台词时载入并返回 true；
    /// 命令耗尽返回 false。
    fn seek_line(&mut self, cues: &mut dyn FnMut(&str)) -> bool {
        while self.cursor < self.commands.len() {
            match &self.commands[self.cursor] {
                VnCommand::Cue { name } => {
                    cues(name);
                    self.cursor += 1;
                }
                VnCommand::Line { speaker, text } => {
                    self.speaker = speaker.clone();
                    self.text = text.clone();
                    self.total = text.chars().count();
                    self.reveal = 0;
                    self.line_done = self.total == 0;
                    self.line_serial += 1;
                    return true;
                }
            }
        }
        false
    }

    /// 推进一步
    ///
    /// - 当前台词未显示完：多显示一个字符，不产生事件
    /// - 已显示完：切到下一句台词（途经的演出标记依次触发）
    /// - 脚本耗尽：置 `finished` 并返回 Auto 事件
    pub fn advance(&mut self, cues: &mut dyn FnMut(&str)) -> Option<GraphEvent> {
        if self.finished {
            return Some(GraphEvent::auto());
        }

        if !self.line_done {
            self.reveal += 1;
            if self.reveal >= self.total {
                self.line_done = true;
            }
            return None;
        }

        self.cursor += 1;
        if self.seek_line(cues) {
            None
        } else {
            debug!("VN 脚本播放完毕");
            self.finished = true;
            Some(GraphEvent::auto())
        }
    }

    /// 立即显示完当前台词，不换句
    pub fn skip_line(&mut self) {
        if self.finished {
            return;
        }
        self.reveal = self.total;
        self.line_done = true;
    }

    /// 快进到脚本末尾
    ///
    /// 途经的每个演出标记都会按文件顺序触发一次，
    /// 结束后返回单个 Auto 事件。
    pub fn fast_forward_all(&mut self, cues: &mut dyn FnMut(&str)) -> GraphEvent {
        while !self.finished {
            self.skip_line();
            self.cursor += 1;
            if !self.seek_line(cues) {
                self.finished = true;
            }
        }
        GraphEvent::auto()
    }

    /// 当前说话者
    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    /// 当前台词全文
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 已显示的字符数
    pub fn reveal(&self) -> usize {
        self.reveal
    }

    /// 当前可见的台词前缀
    pub fn visible_text(&self) -> &str {
        match self.text.char_indices().nth(self.reveal) {
            Some((byte_pos, _)) => &self.text[..byte_pos],
            None => &self.text,
        }
    }

    /// 当前台词是否已显示完
    pub fn line_done(&self) -> bool {
        self.line_done
    }

    /// 脚本是否已播放完
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 台词序号
    pub fn line_serial(&self) -> u64 {
        self.line_serial
    }
}
