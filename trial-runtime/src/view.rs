//! # View 模块
//!
//! 提供给表现层的只读快照。
//!
//! ## 设计说明
//!
//! - 每次 tick / 意图调用结束后整体重建，没有独立生命周期
//! - 至多一个与当前节点类型对应的子视图被填充
//! - 全部可序列化，宿主可以把快照原样送过任何边界（UI 线程、
//!   WebView、调试工具）

use serde::Serialize;

use crate::markup::TextRun;
use crate::resource::{EvidenceItem, OptionEntry};
use crate::timer::Countdown;

use crate::graph::NodeKind;

/// VN 子视图
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VnView {
    /// 说话者（None 表示旁白）
    pub speaker: Option<String>,
    /// 台词全文
    pub text: String,
    /// 当前可见前缀
    pub visible_text: String,
    /// 已显示的字符数
    pub reveal_chars: usize,
    /// 当前台词是否显示完
    pub line_done: bool,
    /// 脚本是否播放完
    pub finished: bool,
}

/// 打开的反驳菜单
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuView {
    /// 菜单挂在哪个 span 上
    pub span_id: String,
    /// 反驳选项
    pub options: Vec<OptionEntry>,
}

/// 辩论子视图
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebateView {
    /// 当前证言下标
    pub statement_index: usize,
    /// 证言总数
    pub statement_count: usize,
    /// 说话者
    pub speaker: String,
    /// 证言文本段（表现层据此高亮疑点）
    pub runs: Vec<TextRun>,
    /// 当前证言里可点开的 span id
    pub span_ids: Vec<String>,
    /// 演出 id
    pub performance: Option<String>,
    /// 打开的菜单（None 表示没打开）
    pub menu: Option<MenuView>,
    /// 是否提交过选项
    pub committed: bool,
}

/// 举证子视图
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresentView {
    /// 提问文本
    pub prompt: String,
    /// 证据列表
    pub items: Vec<EvidenceItem>,
}

/// 选择子视图
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChoiceView {
    /// 选项列表
    pub options: Vec<OptionEntry>,
}

/// 计时器快照
///
/// 未装填的计时器为 `None`。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimerView {
    /// 节点限时
    pub node: Option<Countdown>,
    /// 证言计时
    pub statement: Option<Countdown>,
    /// 台词自动推进计时
    pub vn_auto: Option<Countdown>,
}

impl TimerView {
    /// 包装一个倒计时快照（未激活时折叠为 None）
    pub(crate) fn gauge(c: &Countdown) -> Option<Countdown> {
        if c.active { Some(c.clone()) } else { None }
    }
}

/// 叙事状态快照
#[derive(Debug, Clone, Serialize)]
pub struct StoryView {
    /// 当前节点 id
    pub node_id: String,
    /// 当前节点类型
    pub kind: NodeKind,
    /// VN 子视图
    pub vn: Option<VnView>,
    /// 辩论子视图
    pub debate: Option<DebateView>,
    /// 举证子视图
    pub present: Option<PresentView>,
    /// 选择子视图
    pub choice: Option<ChoiceView>,
    /// 计时器快照
    pub timers: TimerView,
}

impl StoryView {
    /// 空快照（Player 启动前）
    pub fn empty() -> Self {
        Self {
            node_id: String::new(),
            kind: NodeKind::Unknown,
            vn: None,
            debate: None,
            present: None,
            choice: None,
            timers: TimerView::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_serializes() {
        let view = StoryView {
            node_id: "n0".to_string(),
            kind: NodeKind::Vn,
            vn: Some(VnView {
                speaker: Some("审判长".to_string()),
                text: "开庭。".to_string(),
                visible_text: "开".to_string(),
                reveal_chars: 1,
                line_done: false,
                finished: false,
            }),
            debate: None,
            present: None,
            choice: None,
            timers: TimerView::default(),
        };

        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"node_id\":\"n0\""));
        assert!(json.contains("\"visible_text\":\"开\""));
    }

    #[test]
    fn test_timer_gauge_folds_inactive() {
        let mut c = Countdown::idle();
        assert!(TimerView::gauge(&c).is_none());
        c.arm(5.0);
        assert_eq!(TimerView::gauge(&c).unwrap().remain_sec, 5.0);
    }
}
