//! # Runner 模块
//!
//! 四种节点类型各自的播放状态机。
//!
//! ## 设计说明
//!
//! - 每个 Runner 只操作自己进入节点时加载的资源，从不接触剧情图
//! - Runner 在每次进入节点时**整体重建**（资源重新加载，内部游标归零）
//! - Player 通过 [`ActiveRunner`] 的穷举 match 分发意图，
//!   不使用 trait 对象

mod choice;
mod debate;
mod present;
mod vn;

pub use choice::ChoiceRunner;
pub use debate::DebateRunner;
pub use present::PresentRunner;
pub use vn::VnRunner;

/// 当前激活的 Runner
///
/// 按节点类型选择：{Vn, Be, Error} -> Vn；Debate / Present / Choice
/// 各自对应；章节终点没有 Runner。
#[derive(Debug)]
pub enum ActiveRunner {
    /// VN 台词播放
    Vn(VnRunner),
    /// 限时辩论
    Debate(DebateRunner),
    /// 举证
    Present(PresentRunner),
    /// 多项选择
    Choice(ChoiceRunner),
    /// 章节终点（无可播放内容）
    Terminal,
}

impl ActiveRunner {
    /// Runner 类型名（用于日志）
    pub fn kind_name(&self) -> &'static str {
        match self {
            ActiveRunner::Vn(_) => "vn",
            ActiveRunner::Debate(_) => "debate",
            ActiveRunner::Present(_) => "present",
            ActiveRunner::Choice(_) => "choice",
            ActiveRunner::Terminal => "terminal",
        }
    }
}
