//! # Player 模块
//!
//! 把图、运行时、Runner、计时器装配在一起的编排层。
//!
//! ## 驱动模型
//!
//! ```text
//! Host                              Player
//!   │                                 │
//!   │──── start(node_id) ───────────►│ 进入节点，重建快照
//!   │──── tick(dt) 每帧 ────────────►│ 驱动计时器，可能合成转移事件
//!   │──── advance()/commit_option()…─►│ 意图 -> Runner -> 可能的转移
//!   │◄─── view() 只读快照 ────────────│
//! ```
//!
//! ## 规则
//!
//! - 意图只在 Runner 能力与当前节点类型匹配时生效，否则记日志吞掉
//! - Runner 产生的每个事件都经由 Runtime 推进，至多一条转移
//! - 转移后立即进入新节点（资源重新加载），并重建快照
//! - 辩论菜单打开期间证言/台词计时暂停，节点限时**不**暂停

use tracing::{debug, warn};

use crate::error::{RuntimeError, StoryResult};
use crate::graph::{Effect, GraphEvent, Node, NodeKind, StoryGraph};
use crate::resource::ResourceLoader;
use crate::runner::{
    ActiveRunner, ChoiceRunner, DebateRunner, PresentRunner, VnRunner,
};
use crate::runtime::StoryRuntime;
use crate::timer::{NodeTimer, StatementTimer, VnAutoTimer, reading_time};
use crate::view::{ChoiceView, DebateView, MenuView, PresentView, StoryView, TimerView, VnView};

/// 效果回调：沿边转移时逐个收到边上的效果
pub type EffectSink = Box<dyn FnMut(&Effect)>;

/// 演出回调：VnRunner 途经演出标记时收到标记名
pub type CueSink = Box<dyn FnMut(&str)>;

/// 触发演出回调（未注入时仅记日志）
fn fire_cue(sink: &mut Option<CueSink>, name: &str) {
    match sink {
        Some(cb) => cb(name),
        None => debug!("演出标记未接回调: '{name}'"),
    }
}

/// 节点限时参数（两个参数齐全的辩论节点才会装填）
fn node_time_limit(node: &Node) -> Option<f64> {
    if node.kind != NodeKind::Debate {
        return None;
    }
    match (node.params.time_limit_sec, &node.params.be_node) {
        (Some(limit), Some(_)) => Some(limit),
        _ => None,
    }
}

/// 叙事播放器
pub struct StoryPlayer {
    /// 转移运行时（持图）
    runtime: StoryRuntime,
    /// 资源加载器
    loader: Box<dyn ResourceLoader>,
    /// 当前激活的 Runner
    runner: ActiveRunner,
    /// 节点限时
    node_timer: NodeTimer,
    /// 证言计时
    statement_timer: StatementTimer,
    /// 台词自动推进计时
    vn_auto_timer: VnAutoTimer,
    /// auto 模式（默认关闭）
    auto_mode: bool,
    /// 全局时间倍率
    time_scale: f64,
    /// 效果回调
    effect_sink: Option<EffectSink>,
    /// 演出回调
    cue_sink: Option<CueSink>,
    /// 最近一次重建的快照
    view: StoryView,
}

impl StoryPlayer {
    /// 创建播放器
    ///
    /// # 参数
    ///
    /// - `graph`: 已校验冻结的剧情图
    /// - `loader`: 节点资源加载器
    pub fn new(graph: StoryGraph, loader: impl ResourceLoader + 'static) -> Self {
        Self {
            runtime: StoryRuntime::new(graph),
            loader: Box::new(loader),
            runner: ActiveRunner::Terminal,
            node_timer: NodeTimer::default(),
            statement_timer: StatementTimer::default(),
            vn_auto_timer: VnAutoTimer::default(),
            auto_mode: false,
            time_scale: 1.0,
            effect_sink: None,
            cue_sink: None,
            view: StoryView::empty(),
        }
    }

    /// 注入效果回调
    pub fn set_effect_sink(&mut self, sink: impl FnMut(&Effect) + 'static) {
        self.effect_sink = Some(Box::new(sink));
    }

    /// 注入演出回调
    pub fn set_cue_sink(&mut self, sink: impl FnMut(&str) + 'static) {
        self.cue_sink = Some(Box::new(sink));
    }

    /// 开关 auto 模式
    pub fn set_auto_mode(&mut self, on: bool) {
        self.auto_mode = on;
    }

    /// auto 模式是否开启
    pub fn auto_mode(&self) -> bool {
        self.auto_mode
    }

    /// 设置全局时间倍率
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    /// 从指定节点开始播放
    pub fn start(&mut self, node_id: &str) -> StoryResult<()> {
        self.runtime.start(node_id)?;
        self.enter_current()?;
        self.rebuild_view();
        Ok(())
    }

    /// 每帧驱动
    ///
    /// dt 先按全局时间倍率缩放。计时器按固定顺序评估：
    /// 节点限时最先（菜单打开也不暂停），然后证言计时、台词计时。
    /// 到期合成的转移事件与用户意图走完全相同的路径。
    pub fn tick(&mut self, dt_sec: f64) -> StoryResult<()> {
        let dt = dt_sec * self.time_scale;

        self.sync_timers();

        // 1. 节点限时
        if self.node_timer.tick(dt) {
            warn!("节点 '{}' 限时耗尽", self.runtime.current_id());
            self.push(&GraphEvent::time_depleted())?;
            self.rebuild_view();
            return Ok(());
        }

        // 辩论菜单打开时，证言/台词计时暂停（辩论停在玩家的决定上）
        let menu_open = matches!(&self.runner, ActiveRunner::Debate(d) if d.is_menu_open());
        if !menu_open {
            // 2. 证言计时：到期等价于一次手动推进
            if self.statement_timer.tick(dt) {
                let ev = match &mut self.runner {
                    ActiveRunner::Debate(d) => d.advance_statement(),
                    _ => None,
                };
                if let Some(ev) = ev {
                    self.push(&ev)?;
                }
            }

            // 3. 台词计时：仅 auto 模式下驱动推进，否则只走表不动作
            if self.vn_auto_timer.tick(dt)
                && self.auto_mode
                && matches!(self.runner, ActiveRunner::Vn(_))
            {
                self.advance_active()?;
            }
        }

        self.rebuild_view();
        Ok(())
    }

    /// 意图：推进（VN 逐字/换句，辩论推进证言）
    pub fn advance(&mut self) -> StoryResult<()> {
        self.advance_active()?;
        self.rebuild_view();
        Ok(())
    }

    /// 意图：快进整个 VN 脚本
    pub fn fast_forward(&mut self) -> StoryResult<()> {
        let ev = match &mut self.runner {
            ActiveRunner::Vn(r) => {
                let cue_sink = &mut self.cue_sink;
                Some(r.fast_forward_all(&mut |name| fire_cue(cue_sink, name)))
            }
            other => {
                debug!("fast_forward 与当前节点不匹配: {}", other.kind_name());
                None
            }
        };
        if let Some(ev) = ev {
            self.push(&ev)?;
        }
        self.rebuild_view();
        Ok(())
    }

    /// 意图：提交选项（辩论菜单 / 多项选择共用）
    pub fn commit_option(&mut self, option_id: &str) -> StoryResult<()> {
        let ev = match &mut self.runner {
            ActiveRunner::Debate(d) => d.commit_option(option_id),
            ActiveRunner::Choice(c) => c.choose(option_id),
            other => {
                debug!(
                    "commit_option('{option_id}') 与当前节点不匹配: {}",
                    other.kind_name()
                );
                None
            }
        };
        if let Some(ev) = ev {
            self.push(&ev)?;
        }
        self.rebuild_view();
        Ok(())
    }

    /// 意图：出示证据
    pub fn pick_evidence(&mut self, item_id: &str) -> StoryResult<()> {
        let ev = match &self.runner {
            ActiveRunner::Present(p) => p.pick(item_id),
            other => {
                debug!(
                    "pick_evidence('{item_id}') 与当前节点不匹配: {}",
                    other.kind_name()
                );
                None
            }
        };
        if let Some(ev) = ev {
            self.push(&ev)?;
        }
        self.rebuild_view();
        Ok(())
    }

    /// 意图：点开疑点菜单
    ///
    /// # 返回
    ///
    /// 菜单是否成功打开（不匹配的节点类型返回 false）。
    pub fn open_suspicion(&mut self, span_id: &str) -> bool {
        let opened = match &mut self.runner {
            ActiveRunner::Debate(d) => d.open_suspicion(span_id),
            other => {
                debug!(
                    "open_suspicion('{span_id}') 与当前节点不匹配: {}",
                    other.kind_name()
                );
                false
            }
        };
        self.rebuild_view();
        opened
    }

    /// 意图：关闭疑点菜单（放弃反驳）
    pub fn close_debate_menu(&mut self) {
        match &mut self.runner {
            ActiveRunner::Debate(d) => d.close_menu(),
            other => {
                debug!("close_debate_menu 与当前节点不匹配: {}", other.kind_name());
            }
        }
        self.rebuild_view();
    }

    /// 当前节点 id
    pub fn current_node_id(&self) -> &str {
        self.runtime.current_id()
    }

    /// 当前是否停在章节终点
    ///
    /// 章节完结由上层流程控制器裁决，本核心只给出提示。
    pub fn is_chapter_end(&self) -> bool {
        self.runtime
            .current_node()
            .map(|n| n.kind == NodeKind::ChapterEnd)
            .unwrap_or(false)
    }

    /// 只读快照
    pub fn view(&self) -> &StoryView {
        &self.view
    }

    /// 推进当前 Runner（意图与计时到期共用）
    fn advance_active(&mut self) -> StoryResult<()> {
        let ev = match &mut self.runner {
            ActiveRunner::Vn(r) => {
                let cue_sink = &mut self.cue_sink;
                r.advance(&mut |name| fire_cue(cue_sink, name))
            }
            ActiveRunner::Debate(d) => d.advance_statement(),
            other => {
                debug!("advance 与当前节点不匹配: {}", other.kind_name());
                None
            }
        };
        if let Some(ev) = ev {
            self.push(&ev)?;
        }
        Ok(())
    }

    /// 把事件推入运行时；发生转移时进入新节点
    fn push(&mut self, event: &GraphEvent) -> StoryResult<bool> {
        let effect_sink = &mut self.effect_sink;
        let moved = self.runtime.push_event(event, &mut |effect| {
            match effect_sink {
                Some(cb) => cb(effect),
                None => debug!("效果未接回调: ({}, '{}')", effect.kind, effect.name),
            }
        })?;
        if moved {
            self.enter_current()?;
        }
        Ok(moved)
    }

    /// 进入当前节点：重新加载资源并重建 Runner
    ///
    /// # 错误
    ///
    /// 资源缺失/损坏，或节点类型无法播放（致命，向上传播）。
    fn enter_current(&mut self) -> StoryResult<()> {
        let node = self.runtime.current_node()?.clone();

        self.node_timer.sync(&node.id, node_time_limit(&node));

        self.runner = match node.kind {
            NodeKind::Vn | NodeKind::Be | NodeKind::Error => {
                let script = self.loader.load_script(&node.resource)?;
                let cue_sink = &mut self.cue_sink;
                ActiveRunner::Vn(VnRunner::enter(script, &mut |name| {
                    fire_cue(cue_sink, name)
                }))
            }
            NodeKind::Debate => {
                ActiveRunner::Debate(DebateRunner::enter(self.loader.load_debate(&node.resource)?))
            }
            NodeKind::Present => ActiveRunner::Present(PresentRunner::enter(
                self.loader.load_present(&node.resource)?,
            )),
            NodeKind::Choice => {
                ActiveRunner::Choice(ChoiceRunner::enter(self.loader.load_choice(&node.resource)?))
            }
            NodeKind::ChapterEnd => ActiveRunner::Terminal,
            NodeKind::Unknown => {
                return Err(RuntimeError::UnsupportedNode {
                    id: node.id.clone(),
                }
                .into());
            }
        };

        Ok(())
    }

    /// 按当前节点与 Runner 状态同步三个计时器的装填
    fn sync_timers(&mut self) {
        if let Ok(node) = self.runtime.current_node() {
            let limit = node_time_limit(node);
            let id = node.id.clone();
            self.node_timer.sync(&id, limit);
        }

        match &self.runner {
            ActiveRunner::Debate(d) => {
                self.statement_timer
                    .sync(d.statement_index(), reading_time(d.current_plain()));
                self.vn_auto_timer.clear();
            }
            ActiveRunner::Vn(v) => {
                self.vn_auto_timer
                    .sync(v.line_serial(), reading_time(v.text()));
                self.statement_timer.clear();
            }
            _ => {
                self.statement_timer.clear();
                self.vn_auto_timer.clear();
            }
        }
    }

    /// 重建只读快照
    fn rebuild_view(&mut self) {
        let node_id = self.runtime.current_id().to_string();
        let kind = self
            .runtime
            .graph()
            .get_node(&node_id)
            .map(|n| n.kind)
            .unwrap_or(NodeKind::Unknown);

        let mut view = StoryView {
            node_id,
            kind,
            vn: None,
            debate: None,
            present: None,
            choice: None,
            timers: TimerView {
                node: TimerView::gauge(self.node_timer.countdown()),
                statement: TimerView::gauge(self.statement_timer.countdown()),
                vn_auto: TimerView::gauge(self.vn_auto_timer.countdown()),
            },
        };

        match &self.runner {
            ActiveRunner::Vn(r) => {
                view.vn = Some(VnView {
                    speaker: r.speaker().map(str::to_string),
                    text: r.text().to_string(),
                    visible_text: r.visible_text().to_string(),
                    reveal_chars: r.reveal(),
                    line_done: r.line_done(),
                    finished: r.is_finished(),
                });
            }
            ActiveRunner::Debate(d) => {
                let mut dv = DebateView {
                    statement_index: d.statement_index(),
                    statement_count: d.statement_count(),
                    committed: d.is_committed(),
                    ..DebateView::default()
                };
                if let Some(s) = d.current_statement() {
                    dv.speaker = s.speaker.clone();
                    dv.runs = s.markup.runs.clone();
                    dv.span_ids = s.markup.span_ids.clone();
                    dv.performance = s.performance.clone();
                }
                if let Some(span_id) = d.open_span() {
                    dv.menu = Some(MenuView {
                        span_id: span_id.to_string(),
                        options: d.open_menu_options().unwrap_or_default().to_vec(),
                    });
                }
                view.debate = Some(dv);
            }
            ActiveRunner::Present(p) => {
                view.present = Some(PresentView {
                    prompt: p.prompt().to_string(),
                    items: p.items().to_vec(),
                });
            }
            ActiveRunner::Choice(c) => {
                view.choice = Some(ChoiceView {
                    options: c.options().to_vec(),
                });
            }
            ActiveRunner::Terminal => {}
        }

        self.view = view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, GraphBuilder, Node, Trigger};
    use crate::resource::MemoryLoader;

    /// 辩论 + 坏结局的小剧情图
    fn debate_fixture() -> StoryPlayer {
        let mut b = GraphBuilder::new();
        b.add_node(
            Node::new("debate", NodeKind::Debate, "debate.json").with_time_limit(5.0, "be1"),
        );
        b.add_node(Node::new("be1", NodeKind::Be, "be1.txt"));
        b.add_node(Node::new("win", NodeKind::Vn, "win.txt"));
        b.add_edge(Edge::new("debate", "be1", Trigger::TimeDepleted, ""));
        b.add_edge(Edge::new("debate", "win", Trigger::Option, "opt_press"));
        b.add_edge(Edge::new("debate", "debate", Trigger::NoCommit, ""));
        let graph = b.build().unwrap();

        let loader = MemoryLoader::new()
            .with_file(
                "debate.json",
                r#"{
                    "statements": [
                        {"speaker": "证人", "text": "我{sus:q1}亲眼看见{/sus}了。"}
                    ],
                    "menus": [
                        {"statement_index": 0, "span_id": "q1",
                         "options": [{"option_id": "opt_press", "label": "追问"}]}
                    ]
                }"#,
            )
            .with_file("be1.txt", "旁白 \"败诉了。\"")
            .with_file("win.txt", "成步堂 \"抓住破绽了！\"");

        StoryPlayer::new(graph, loader)
    }

    #[test]
    fn test_time_depletion_routes_to_be_node() {
        let mut p = debate_fixture();
        p.start("debate").unwrap();

        // 累计 5 秒后限时耗尽
        for _ in 0..10 {
            p.tick(0.5).unwrap();
        }
        assert_eq!(p.current_node_id(), "be1");
        assert_eq!(p.view().kind, NodeKind::Be);
        assert!(p.view().vn.is_some());
    }

    #[test]
    fn test_menu_commit_transitions() {
        let mut p = debate_fixture();
        p.start("debate").unwrap();

        assert!(p.open_suspicion("q1"));
        assert!(p.view().debate.as_ref().unwrap().menu.is_some());

        p.commit_option("opt_press").unwrap();
        assert_eq!(p.current_node_id(), "win");
    }

    #[test]
    fn test_node_timer_keeps_running_under_open_menu() {
        let mut p = debate_fixture();
        p.start("debate").unwrap();
        p.open_suspicion("q1");

        // 菜单打开不暂停节点限时
        for _ in 0..10 {
            p.tick(0.5).unwrap();
        }
        assert_eq!(p.current_node_id(), "be1");
    }

    #[test]
    fn test_statement_timer_paused_under_open_menu() {
        let mut p = debate_fixture();
        p.start("debate").unwrap();
        p.tick(0.1).unwrap();
        let before = p.view().timers.statement.clone().unwrap().remain_sec;

        p.open_suspicion("q1");
        p.tick(1.0).unwrap();
        let after = p.view().timers.statement.clone().unwrap().remain_sec;

        // 菜单打开期间证言计时不走
        assert!((before - after).abs() < 1e-9);
    }

    #[test]
    fn test_time_scale_speeds_up_depletion() {
        let mut p = debate_fixture();
        p.set_time_scale(10.0);
        p.start("debate").unwrap();

        p.tick(0.6).unwrap(); // 0.6 * 10 = 6 秒 > 5 秒限时
        assert_eq!(p.current_node_id(), "be1");
    }

    #[test]
    fn test_mismatched_intents_are_noops() {
        let mut p = debate_fixture();
        p.start("debate").unwrap();

        // 辩论节点上的 VN / 举证意图全部吞掉
        p.fast_forward().unwrap();
        p.pick_evidence("evid_x").unwrap();
        assert_eq!(p.current_node_id(), "debate");

        // 没打开菜单时提交无效
        p.commit_option("opt_press").unwrap();
        assert_eq!(p.current_node_id(), "debate");
    }

    #[test]
    fn test_effect_sink_receives_edge_effects() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut b = GraphBuilder::new();
        b.add_node(Node::new("n0", NodeKind::Vn, "n0.txt"));
        b.add_node(Node::new("n1", NodeKind::ChapterEnd, ""));
        b.add_edge(
            Edge::new("n0", "n1", Trigger::Auto, "")
                .with_effects(vec![Effect::new("se", "gavel")]),
        );
        let loader = MemoryLoader::new().with_file("n0.txt", "法官 \"退庭。\"");

        let mut p = StoryPlayer::new(b.build().unwrap(), loader);
        let fired = Rc::new(RefCell::new(Vec::new()));
        let fired_in = fired.clone();
        p.set_effect_sink(move |e| fired_in.borrow_mut().push(e.clone()));

        p.start("n0").unwrap();
        p.fast_forward().unwrap();

        assert_eq!(p.current_node_id(), "n1");
        assert!(p.is_chapter_end());
        assert_eq!(*fired.borrow(), vec![Effect::new("se", "gavel")]);
    }

    #[test]
    fn test_auto_mode_advances_vn() {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new("n0", NodeKind::Vn, "n0.txt"));
        b.add_node(Node::new("end", NodeKind::ChapterEnd, ""));
        b.add_edge(Edge::new("n0", "end", Trigger::Auto, ""));
        // 一句单字台词：一次 advance 即显示完
        let loader = MemoryLoader::new().with_file("n0.txt", "A \"嗯\"");

        let mut p = StoryPlayer::new(b.build().unwrap(), loader);
        p.start("n0").unwrap();

        // auto 关闭：计时到期也不推进
        for _ in 0..30 {
            p.tick(0.5).unwrap();
        }
        assert_eq!(p.view().vn.as_ref().unwrap().reveal_chars, 0);

        // 重新进入并打开 auto
        let mut p = {
            let mut b = GraphBuilder::new();
            b.add_node(Node::new("n0", NodeKind::Vn, "n0.txt"));
            b.add_node(Node::new("end", NodeKind::ChapterEnd, ""));
            b.add_edge(Edge::new("n0", "end", Trigger::Auto, ""));
            StoryPlayer::new(
                b.build().unwrap(),
                MemoryLoader::new().with_file("n0.txt", "A \"嗯\""),
            )
        };
        p.set_auto_mode(true);
        p.start("n0").unwrap();

        // 到期一次推进一步（阅读时长下限 2 秒）
        for _ in 0..5 {
            p.tick(1.0).unwrap();
        }
        assert_eq!(p.view().vn.as_ref().unwrap().reveal_chars, 1);
    }
}
