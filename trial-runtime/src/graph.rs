//! # Graph 模块
//!
//! 剧情图：不可变的有向图，节点是叙事单元，边是带触发条件的转移。
//!
//! ## 设计原则
//!
//! - **一次构建，终生只读**：通过 [`GraphBuilder`] 追加节点/边，
//!   `build()` 时校验并冻结，之后运行时只做查询
//! - **O(1) 转移查找**：`(from, trigger, key)` 三元组索引在构建时派生
//! - **查不到边是常态**：[`StoryGraph::find_edge`] 返回 `None` 表示
//!   事件被丢弃，不是错误

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::GraphError;

/// 节点类型
///
/// 决定播放该节点时使用哪种 Runner。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// 普通对话节点
    Vn,
    /// 坏结局节点（机制上与 Vn 相同，仅叙事含义不同）
    Be,
    /// 失误/纠错节点（机制上与 Vn 相同）
    Error,
    /// 限时辩论节点
    Debate,
    /// 举证节点
    Present,
    /// 多项选择节点
    Choice,
    /// 章节终点
    ChapterEnd,
    /// 未知类型（加载器遇到无法识别的字符串时保留）
    Unknown,
}

impl NodeKind {
    /// 从字符串解析节点类型（不区分大小写，未知值归入 `Unknown`）
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "vn" => Self::Vn,
            "be" => Self::Be,
            "error" => Self::Error,
            "debate" => Self::Debate,
            "present" => Self::Present,
            "choice" => Self::Choice,
            "chapter_end" | "chapterend" => Self::ChapterEnd,
            _ => Self::Unknown,
        }
    }

    /// 是否由 VnRunner 播放（Vn / Be / Error 共用 VN 脚本格式）
    pub fn plays_as_vn(&self) -> bool {
        matches!(self, Self::Vn | Self::Be | Self::Error)
    }
}

/// 边的触发条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// 内容播放完毕后自动触发
    Auto,
    /// 提交了某个选项（辩论菜单 / 多项选择）
    Option,
    /// 出示了某件证据
    Pick,
    /// 辩论走到末尾仍未提交
    NoCommit,
    /// 限时耗尽
    TimeDepleted,
    /// 未知触发条件
    Unknown,
}

impl Trigger {
    /// 从字符串解析触发条件（未知值归入 `Unknown`）
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Self::Auto,
            "option" => Self::Option,
            "pick" => Self::Pick,
            "no_commit" | "nocommit" => Self::NoCommit,
            "time_depleted" | "timedepleted" => Self::TimeDepleted,
            _ => Self::Unknown,
        }
    }

    /// 该触发条件是否要求非空 key
    pub fn requires_key(&self) -> bool {
        matches!(self, Self::Option | Self::Pick)
    }

    /// 触发条件名称（用于日志和错误消息）
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Option => "option",
            Self::Pick => "pick",
            Self::NoCommit => "no_commit",
            Self::TimeDepleted => "time_depleted",
            Self::Unknown => "unknown",
        }
    }
}

/// 节点附加参数
///
/// 目前只有限时辩论节点使用：两个字段同时存在时才会装填节点限时。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeParams {
    /// 限时秒数
    #[serde(default)]
    pub time_limit_sec: Option<f64>,
    /// 限时耗尽后路由到的坏结局节点 id
    #[serde(default)]
    pub be_node: Option<String>,
}

/// 剧情图节点
///
/// 加载完成后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// 节点 id（图内唯一）
    pub id: String,
    /// 节点类型
    pub kind: NodeKind,
    /// 资源路径（Runner 进入节点时加载）
    pub resource: String,
    /// 附加参数
    #[serde(default)]
    pub params: NodeParams,
}

impl Node {
    /// 创建节点
    pub fn new(id: impl Into<String>, kind: NodeKind, resource: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            resource: resource.into(),
            params: NodeParams::default(),
        }
    }

    /// 设置附加参数
    pub fn with_params(mut self, params: NodeParams) -> Self {
        self.params = params;
        self
    }

    /// 设置限时参数（便捷方法）
    pub fn with_time_limit(mut self, secs: f64, be_node: impl Into<String>) -> Self {
        self.params.time_limit_sec = Some(secs);
        self.params.be_node = Some(be_node.into());
        self
    }
}

/// 边上的效果
///
/// `(type, name)` 自由字符串对，本核心不解释其语义，
/// 原样转发给宿主注入的回调。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// 效果类型
    #[serde(rename = "type")]
    pub kind: String,
    /// 效果名称
    pub name: String,
}

impl Effect {
    /// 创建效果
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// 剧情图的边
///
/// 加载完成后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// 起点节点 id
    pub from: String,
    /// 终点节点 id
    pub to: String,
    /// 触发条件
    pub trigger: Trigger,
    /// 区分同类触发的 key（Option/Pick 必须非空，其余为空串）
    #[serde(default)]
    pub key: String,
    /// 沿此边转移时依次触发的效果
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Edge {
    /// 创建边
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        trigger: Trigger,
        key: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            trigger,
            key: key.into(),
            effects: Vec::new(),
        }
    }

    /// 设置效果列表
    pub fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }
}

/// 推入运行时的转移事件
///
/// `(trigger, key)` 二元组。Runner 产生事件，Runtime 按事件查边。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEvent {
    /// 触发条件
    pub trigger: Trigger,
    /// 区分 key（无 key 的触发条件为空串）
    pub key: String,
}

impl GraphEvent {
    /// 自动转移事件
    pub fn auto() -> Self {
        Self {
            trigger: Trigger::Auto,
            key: String::new(),
        }
    }

    /// 选项提交事件
    pub fn option(key: impl Into<String>) -> Self {
        Self {
            trigger: Trigger::Option,
            key: key.into(),
        }
    }

    /// 证据出示事件
    pub fn pick(key: impl Into<String>) -> Self {
        Self {
            trigger: Trigger::Pick,
            key: key.into(),
        }
    }

    /// 未提交事件
    pub fn no_commit() -> Self {
        Self {
            trigger: Trigger::NoCommit,
            key: String::new(),
        }
    }

    /// 限时耗尽事件
    pub fn time_depleted() -> Self {
        Self {
            trigger: Trigger::TimeDepleted,
            key: String::new(),
        }
    }
}

/// 冻结后的剧情图
///
/// 只能通过 [`GraphBuilder`] 构建。构建完成后内部结构不再变化，
/// 运行时对它只做查询。
#[derive(Debug, Clone)]
pub struct StoryGraph {
    /// 节点表（id -> Node）
    nodes: HashMap<String, Node>,
    /// 边列表
    edges: Vec<Edge>,
    /// 转移索引：(from, trigger, key) -> 边下标
    index: HashMap<(String, Trigger, String), usize>,
}

impl StoryGraph {
    /// 节点是否存在
    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// 获取节点
    ///
    /// 图经过校验后所有在用 id 都应命中；`None` 由调用方升级为致命错误。
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// 按事件查找出边
    ///
    /// 返回 `None` 表示没有匹配的转移，这是正常结果而非错误。
    pub fn find_edge(&self, from: &str, event: &GraphEvent) -> Option<&Edge> {
        self.index
            .get(&(from.to_string(), event.trigger, event.key.clone()))
            .map(|i| &self.edges[*i])
    }

    /// 节点数量
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 边数量
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// 剧情图构建器
///
/// 追加节点和边，`build()` 一次性校验并派生转移索引。
///
/// # 校验项
///
/// - 节点 id 唯一
/// - Option/Pick 边的 key 非空
/// - 边的两端都指向已存在的节点
/// - 同一节点不存在两条相同 `(trigger, key)` 的出边
/// - 章节终点节点没有出边
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    /// 创建构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加节点
    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// 追加边
    pub fn add_edge(&mut self, edge: Edge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    /// 校验并冻结为 [`StoryGraph`]
    pub fn build(self) -> Result<StoryGraph, GraphError> {
        let mut nodes = HashMap::with_capacity(self.nodes.len());
        for node in self.nodes {
            if nodes.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode { id: node.id });
            }
            nodes.insert(node.id.clone(), node);
        }

        let mut index = HashMap::with_capacity(self.edges.len());
        for (i, edge) in self.edges.iter().enumerate() {
            if edge.trigger.requires_key() && edge.key.is_empty() {
                return Err(GraphError::MissingEdgeKey {
                    from: edge.from.clone(),
                    trigger: edge.trigger.as_str().to_string(),
                });
            }
            if !nodes.contains_key(&edge.from) || !nodes.contains_key(&edge.to) {
                return Err(GraphError::UnknownEndpoint {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }
            if nodes[&edge.from].kind == NodeKind::ChapterEnd {
                return Err(GraphError::TerminalOutgoing {
                    id: edge.from.clone(),
                });
            }
            let slot = (edge.from.clone(), edge.trigger, edge.key.clone());
            if index.insert(slot, i).is_some() {
                return Err(GraphError::AmbiguousTransition {
                    from: edge.from.clone(),
                    trigger: edge.trigger.as_str().to_string(),
                    key: edge.key.clone(),
                });
            }
        }

        Ok(StoryGraph {
            nodes,
            edges: self.edges,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_graph() -> StoryGraph {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new("n0", NodeKind::Vn, "scripts/n0.txt"));
        b.add_node(Node::new("n1", NodeKind::ChapterEnd, ""));
        b.add_edge(Edge::new("n0", "n1", Trigger::Auto, ""));
        b.build().unwrap()
    }

    #[test]
    fn test_node_kind_parse() {
        assert_eq!(NodeKind::parse("vn"), NodeKind::Vn);
        assert_eq!(NodeKind::parse("BE"), NodeKind::Be);
        assert_eq!(NodeKind::parse("chapter_end"), NodeKind::ChapterEnd);
        assert_eq!(NodeKind::parse("whatever"), NodeKind::Unknown);

        assert!(NodeKind::Be.plays_as_vn());
        assert!(NodeKind::Error.plays_as_vn());
        assert!(!NodeKind::Debate.plays_as_vn());
    }

    #[test]
    fn test_trigger_parse() {
        assert_eq!(Trigger::parse("auto"), Trigger::Auto);
        assert_eq!(Trigger::parse("no_commit"), Trigger::NoCommit);
        assert_eq!(Trigger::parse("???"), Trigger::Unknown);
        assert!(Trigger::Option.requires_key());
        assert!(!Trigger::Auto.requires_key());
    }

    #[test]
    fn test_find_edge() {
        let g = two_node_graph();

        let edge = g.find_edge("n0", &GraphEvent::auto()).unwrap();
        assert_eq!(edge.to, "n1");

        // 无匹配边是正常结果
        assert!(g.find_edge("n0", &GraphEvent::option("x")).is_none());
        assert!(g.find_edge("n1", &GraphEvent::auto()).is_none());
    }

    #[test]
    fn test_find_edge_by_key() {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new("q", NodeKind::Choice, "choice.json"));
        b.add_node(Node::new("a", NodeKind::Vn, "a.txt"));
        b.add_node(Node::new("b", NodeKind::Vn, "b.txt"));
        b.add_edge(Edge::new("q", "a", Trigger::Option, "opt_a"));
        b.add_edge(Edge::new("q", "b", Trigger::Option, "opt_b"));
        let g = b.build().unwrap();

        assert_eq!(g.find_edge("q", &GraphEvent::option("opt_a")).unwrap().to, "a");
        assert_eq!(g.find_edge("q", &GraphEvent::option("opt_b")).unwrap().to, "b");
        assert!(g.find_edge("q", &GraphEvent::option("opt_c")).is_none());
    }

    #[test]
    fn test_build_rejects_duplicate_node() {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new("n0", NodeKind::Vn, "x"));
        b.add_node(Node::new("n0", NodeKind::Vn, "y"));
        assert!(matches!(
            b.build(),
            Err(GraphError::DuplicateNode { id }) if id == "n0"
        ));
    }

    #[test]
    fn test_build_rejects_dangling_edge() {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new("n0", NodeKind::Vn, "x"));
        b.add_edge(Edge::new("n0", "missing", Trigger::Auto, ""));
        assert!(matches!(b.build(), Err(GraphError::UnknownEndpoint { .. })));
    }

    #[test]
    fn test_build_rejects_ambiguous_transition() {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new("n0", NodeKind::Debate, "d.json"));
        b.add_node(Node::new("a", NodeKind::Vn, "a.txt"));
        b.add_node(Node::new("b", NodeKind::Vn, "b.txt"));
        b.add_edge(Edge::new("n0", "a", Trigger::Option, "opt"));
        b.add_edge(Edge::new("n0", "b", Trigger::Option, "opt"));
        assert!(matches!(
            b.build(),
            Err(GraphError::AmbiguousTransition { .. })
        ));
    }

    #[test]
    fn test_build_rejects_missing_key() {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new("n0", NodeKind::Present, "p.json"));
        b.add_node(Node::new("n1", NodeKind::Vn, "n1.txt"));
        b.add_edge(Edge::new("n0", "n1", Trigger::Pick, ""));
        assert!(matches!(b.build(), Err(GraphError::MissingEdgeKey { .. })));
    }

    #[test]
    fn test_build_rejects_terminal_outgoing() {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new("end", NodeKind::ChapterEnd, ""));
        b.add_node(Node::new("n1", NodeKind::Vn, "n1.txt"));
        b.add_edge(Edge::new("end", "n1", Trigger::Auto, ""));
        assert!(matches!(
            b.build(),
            Err(GraphError::TerminalOutgoing { id }) if id == "end"
        ));
    }

    #[test]
    fn test_effect_json_uses_type_field() {
        let e = Effect::new("se", "objection");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"type\":\"se\""));
        let back: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
