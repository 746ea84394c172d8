//! # Trial Runtime
//!
//! 法庭剧分支叙事引擎的核心运行时库。
//!
//! ## 架构概述
//!
//! `trial-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 宿主层（Host）构建校验好的剧情图，围绕它创建 [`StoryPlayer`]，
//! 每帧调用 `tick(dt)` 并在帧间发出意图：
//!
//! ```text
//! Host                                Player
//!   │                                   │
//!   │──── start / tick / 意图 ────────►│
//!   │                                   │ Runner 产生 GraphEvent
//!   │                                   │ Runtime 查边、触发效果、移动节点
//!   │◄─── StoryView 只读快照 ───────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`StoryGraph`] / [`GraphBuilder`]：节点 + 触发边的不可变有向图
//! - [`StoryPlayer`]：编排层（Runner 分发、计时器驱动、快照重建）
//! - [`StoryRuntime`]：转移运行时（查边、效果、当前位置）
//! - [`StoryView`]：每次 tick/意图后整体重建的只读快照
//!
//! ## 模块结构
//!
//! - [`graph`]：剧情图数据结构与转移索引
//! - [`markup`]：辩论台词的疑点标记子语言
//! - [`script`]：VN 脚本模型与文本解析
//! - [`resource`]：节点资源模型与加载抽象
//! - [`runner`]：四种节点类型的播放状态机
//! - [`timer`]：倒计时与三个独立计时器
//! - [`runtime`]：转移运行时
//! - [`player`]：编排层
//! - [`view`]：只读快照
//! - [`error`]：错误类型定义

pub mod error;
pub mod graph;
pub mod markup;
pub mod player;
pub mod resource;
pub mod runner;
pub mod runtime;
pub mod script;
pub mod timer;
pub mod view;

// 重导出核心类型
pub use error::{
    GraphError, MarkupError, ResourceError, RuntimeError, ScriptError, StoryError, StoryResult,
};
pub use graph::{
    Edge, Effect, GraphBuilder, GraphEvent, Node, NodeKind, NodeParams, StoryGraph, Trigger,
};
pub use markup::{MarkupText, TextRun, parse_markup};
pub use player::{CueSink, EffectSink, StoryPlayer};
pub use resource::{
    ChoiceDef, DebateDef, EvidenceItem, FsLoader, MemoryLoader, MenuDef, OptionEntry, PresentDef,
    ResourceLoader, Statement,
};
pub use runner::{ActiveRunner, ChoiceRunner, DebateRunner, PresentRunner, VnRunner};
pub use runtime::StoryRuntime;
pub use script::{VnCommand, VnScript, parse_script};
pub use timer::{Countdown, NodeTimer, StatementTimer, VnAutoTimer, reading_time};
pub use view::{
    ChoiceView, DebateView, MenuView, PresentView, StoryView, TimerView, VnView,
};
