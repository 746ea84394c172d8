//! # DebateRunner 模块
//!
//! 限时辩论状态机：按顺序播放证言，证言里的疑点段可以点开
//! 反驳菜单；整场辩论共享一个粘性的「已提交」标志。
//!
//! ## 状态
//!
//! - 当前证言下标
//! - 菜单开闭（同一时刻至多一个菜单打开）
//! - `committed`：一旦提交过任何选项就永久为 true，从不重置

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::graph::GraphEvent;
use crate::markup::{MarkupText, parse_markup};
use crate::resource::{DebateDef, OptionEntry};

/// 一条证言的运行期形态（标记已解析）
#[derive(Debug)]
pub struct StatementState {
    /// 说话者
    pub speaker: String,
    /// 解析后的文本段与疑点列表
    pub markup: MarkupText,
    /// 演出 id
    pub performance: Option<String>,
}

/// 辩论播放状态机
#[derive(Debug)]
pub struct DebateRunner {
    /// 证言列表
    statements: Vec<StatementState>,
    /// 菜单索引：(证言下标, span id) -> 选项列表
    menus: HashMap<(usize, String), Vec<OptionEntry>>,
    /// 当前证言下标
    index: usize,
    /// 当前打开的菜单对应的 span id
    open_span: Option<String>,
    /// 粘性提交标志
    committed: bool,
}

impl DebateRunner {
    /// 进入节点：从辩论定义重建全部状态
    ///
    /// 每条证言的疑点标记在此时解析；解析失败的证言退回纯文本
    /// （没有可点开的疑点）。
    pub fn enter(def: DebateDef) -> Self {
        let statements = def
            .statements
            .into_iter()
            .map(|s| {
                let markup = match parse_markup(&s.text) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("证言标记解析失败，退回纯文本: {e}");
                        MarkupText::plain_fallback(&s.text)
                    }
                };
                StatementState {
                    speaker: s.speaker,
                    markup,
                    performance: s.performance,
                }
            })
            .collect();

        let mut menus = HashMap::new();
        for menu in def.menus {
            let slot = (menu.statement_index, menu.span_id.clone());
            if menus.insert(slot, menu.options).is_some() {
                warn!(
                    "菜单重复定义: 证言 {} 的 span '{}'，保留后者",
                    menu.statement_index, menu.span_id
                );
            }
        }

        Self {
            statements,
            menus,
            index: 0,
            open_span: None,
            committed: false,
        }
    }

    /// 推进到下一条证言
    ///
    /// - 菜单打开时是 no-op（辩论停在玩家的决定上）
    /// - 已是最后一条且未提交过：返回 NoCommit 事件
    /// - 已是最后一条且提交过：停在末尾，等待外部 Auto 转移
    pub fn advance_statement(&mut self) -> Option<GraphEvent> {
        if self.open_span.is_some() {
            debug!("菜单打开时不推进证言");
            return None;
        }

        if self.index + 1 < self.statements.len() {
            self.index += 1;
            return None;
        }

        if !self.committed {
            return Some(GraphEvent::no_commit());
        }
        None
    }

    /// 点开当前证言上的疑点菜单
    ///
    /// # 返回
    ///
    /// 已有菜单打开，或 (当前证言, span id) 没有注册菜单时返回 false。
    pub fn open_suspicion(&mut self, span_id: &str) -> bool {
        if self.open_span.is_some() {
            debug!("已有菜单打开，忽略 open_suspicion('{span_id}')");
            return false;
        }
        if !self
            .menus
            .contains_key(&(self.index, span_id.to_string()))
        {
            debug!("证言 {} 没有 span '{span_id}' 的菜单", self.index);
            return false;
        }
        self.open_span = Some(span_id.to_string());
        true
    }

    /// 提交打开菜单里的某个选项
    ///
    /// 成功时关闭菜单、置粘性提交标志，并返回 Option 事件；
    /// 菜单未打开或选项 id 不存在时状态不变。
    pub fn commit_option(&mut self, option_id: &str) -> Option<GraphEvent> {
        let Some(span_id) = &self.open_span else {
            debug!("没有打开的菜单，忽略 commit_option('{option_id}')");
            return None;
        };

        let Some(options) = self.menus.get(&(self.index, span_id.clone())) else {
            debug!("打开的 span '{span_id}' 没有对应菜单");
            return None;
        };
        if !options.iter().any(|o| o.id == option_id) {
            debug!("菜单里没有选项 '{option_id}'");
            return None;
        }

        self.open_span = None;
        self.committed = true;
        Some(GraphEvent::option(option_id))
    }

    /// 关闭菜单，不提交（放弃这次反驳）
    pub fn close_menu(&mut self) {
        self.open_span = None;
    }

    /// 当前证言下标
    pub fn statement_index(&self) -> usize {
        self.index
    }

    /// 证言总数
    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    /// 当前证言
    pub fn current_statement(&self) -> Option<&StatementState> {
        self.statements.get(self.index)
    }

    /// 当前证言的纯文本（计时估算用）
    pub fn current_plain(&self) -> &str {
        self.current_statement()
            .map(|s| s.markup.plain.as_str())
            .unwrap_or("")
    }

    /// 是否有菜单打开
    pub fn is_menu_open(&self) -> bool {
        self.open_span.is_some()
    }

    /// 当前打开的 span id
    pub fn open_span(&self) -> Option<&str> {
        self.open_span.as_deref()
    }

    /// 打开菜单的选项列表
    pub fn open_menu_options(&self) -> Option<&[OptionEntry]> {
        let span_id = self.open_span.as_ref()?;
        self.menus
            .get(&(self.index, span_id.clone()))
            .map(Vec::as_slice)
    }

    /// 是否提交过任何选项
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}
