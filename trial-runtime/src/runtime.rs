//! # Runtime 模块
//!
//! 在剧情图上应用转移事件。
//!
//! ## 执行模型
//!
//! ```text
//! push_event(event, effects) -> Ok(是否发生了转移)
//! ```
//!
//! 1. 按 (当前节点, trigger, key) 查边
//! 2. 查不到：记日志丢弃，**不是错误**
//! 3. 查到：依次触发边上的效果，移动当前节点
//!
//! 每次调用至多推进一条转移；事件不排队。

use tracing::debug;

use crate::error::{RuntimeError, StoryResult};
use crate::graph::{Effect, GraphEvent, Node, StoryGraph};

/// 转移运行时
///
/// 持有冻结的剧情图和当前节点 id，是本核心里唯一会移动
/// 「当前位置」的组件。
#[derive(Debug)]
pub struct StoryRuntime {
    /// 剧情图（终生只读）
    graph: StoryGraph,
    /// 当前节点 id
    current: String,
}

impl StoryRuntime {
    /// 创建运行时
    ///
    /// 初始位置为空，必须先调用 [`start`](Self::start)。
    pub fn new(graph: StoryGraph) -> Self {
        Self {
            graph,
            current: String::new(),
        }
    }

    /// 直接进入指定节点
    ///
    /// # 错误
    ///
    /// 节点不存在时返回致命错误。
    pub fn start(&mut self, node_id: &str) -> StoryResult<()> {
        if !self.graph.has_node(node_id) {
            return Err(RuntimeError::NodeNotFound {
                id: node_id.to_string(),
            }
            .into());
        }
        self.current = node_id.to_string();
        Ok(())
    }

    /// 推入转移事件
    ///
    /// # 返回
    ///
    /// - `Ok(true)`：发生了转移，当前节点已更新
    /// - `Ok(false)`：没有匹配的边，事件被丢弃
    ///
    /// # 错误
    ///
    /// 边的目标节点不存在（图校验后不可达，防御性检查）。
    pub fn push_event(
        &mut self,
        event: &GraphEvent,
        effects: &mut dyn FnMut(&Effect),
    ) -> StoryResult<bool> {
        let Some(edge) = self.graph.find_edge(&self.current, event) else {
            debug!(
                "节点 '{}' 没有 ({}, '{}') 的出边，事件丢弃",
                self.current,
                event.trigger.as_str(),
                event.key
            );
            return Ok(false);
        };

        // 先触发效果，再移动位置（效果内容不做校验，尽力转发）
        for effect in &edge.effects {
            effects(effect);
        }

        if !self.graph.has_node(&edge.to) {
            return Err(RuntimeError::NodeNotFound {
                id: edge.to.clone(),
            }
            .into());
        }

        let to = edge.to.clone();
        debug!("转移: '{}' -> '{}'", self.current, to);
        self.current = to;
        Ok(true)
    }

    /// 当前节点 id
    pub fn current_id(&self) -> &str {
        &self.current
    }

    /// 当前节点
    ///
    /// # 错误
    ///
    /// 当前 id 不在图中（防御性检查，应当不可达）。
    pub fn current_node(&self) -> StoryResult<&Node> {
        self.graph.get_node(&self.current).ok_or_else(|| {
            RuntimeError::NodeNotFound {
                id: self.current.clone(),
            }
            .into()
        })
    }

    /// 剧情图
    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }
}
