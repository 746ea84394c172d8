//! # 终端演示宿主
//!
//! 在终端里驱动 trial-runtime 走完一个内嵌的演示章节。
//! 不做任何渲染，只把只读快照打印成文本，验证意图/事件链路。
//!
//! ## 操作
//!
//! - 回车：advance（VN 逐字 / 辩论推进证言）
//! - `ff`：快进整个 VN 脚本
//! - `sus <span_id>`：点开疑点菜单
//! - `commit <option_id>`：提交选项（辩论菜单 / 多项选择）
//! - `pick <item_id>`：出示证据
//! - `close`：关闭菜单
//! - `quit`：退出

use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use trial_runtime::{
    Edge, Effect, GraphBuilder, MemoryLoader, Node, NodeKind, StoryGraph, StoryPlayer, Trigger,
};

/// trial-runtime 终端演示宿主
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// 开启 auto 模式（台词按阅读时长自动推进）
    #[arg(long)]
    auto: bool,

    /// 全局时间倍率
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,
}

/// 内嵌演示章节的剧情图
fn demo_graph() -> Result<StoryGraph> {
    let mut b = GraphBuilder::new();
    b.add_node(Node::new("intro", NodeKind::Vn, "intro.txt"));
    b.add_node(Node::new("ask", NodeKind::Choice, "ask.json"));
    b.add_node(
        Node::new("debate", NodeKind::Debate, "debate.json").with_time_limit(30.0, "be_timeout"),
    );
    b.add_node(Node::new("present", NodeKind::Present, "present.json"));
    b.add_node(Node::new("be_timeout", NodeKind::Be, "be_timeout.txt"));
    b.add_node(Node::new("verdict", NodeKind::Vn, "verdict.txt"));
    b.add_node(Node::new("end", NodeKind::ChapterEnd, ""));

    b.add_edge(Edge::new("intro", "ask", Trigger::Auto, ""));
    b.add_edge(Edge::new("ask", "debate", Trigger::Option, "opt_fight"));
    b.add_edge(Edge::new("ask", "verdict", Trigger::Option, "opt_concede"));
    b.add_edge(
        Edge::new("debate", "present", Trigger::Option, "opt_receipt")
            .with_effects(vec![Effect::new("se", "objection")]),
    );
    b.add_edge(Edge::new("debate", "debate", Trigger::NoCommit, ""));
    b.add_edge(Edge::new("debate", "be_timeout", Trigger::TimeDepleted, ""));
    b.add_edge(
        Edge::new("present", "verdict", Trigger::Pick, "evid_receipt")
            .with_effects(vec![Effect::new("flag", "case_cracked")]),
    );
    b.add_edge(Edge::new("be_timeout", "end", Trigger::Auto, ""));
    b.add_edge(Edge::new("verdict", "end", Trigger::Auto, ""));

    Ok(b.build()?)
}

/// 内嵌演示章节的资源
fn demo_loader() -> MemoryLoader {
    MemoryLoader::new()
        .with_file(
            "intro.txt",
            "# 开庭\n\
             = bgm_court =\n\
             审判长 \"现在开庭。被告方，准备好了吗？\"\n\
             成步堂 「准备完毕，审判长。」",
        )
        .with_file(
            "ask.json",
            r#"{"options": [
                {"option_id": "opt_fight", "label": "据理力争"},
                {"option_id": "opt_concede", "label": "接受判决"}
            ]}"#,
        )
        .with_file(
            "debate.json",
            r#"{
                "statements": [
                    {"speaker": "证人", "text": "案发当晚，我{sus:q_home}一直待在家里{/sus}。"},
                    {"speaker": "证人", "text": "所以我{sus:q_saw}什么都没看见{/sus}。", "performance": "sweat"}
                ],
                "menus": [
                    {"statement_index": 0, "span_id": "q_home",
                     "options": [
                        {"option_id": "opt_receipt", "label": "出示出租车收据"},
                        {"option_id": "opt_press", "label": "继续追问"}
                     ]}
                ]
            }"#,
        )
        .with_file(
            "present.json",
            r#"{
                "prompt": "出示证明证人说谎的证据！",
                "items": [
                    {"item_id": "evid_receipt", "label": "出租车收据"},
                    {"item_id": "evid_knife", "label": "水果刀"}
                ]
            }"#,
        )
        .with_file("be_timeout.txt", "旁白 \"时间耗尽，辩护以失败告终……\"")
        .with_file("verdict.txt", "审判长 \"本庭宣判：被告无罪！\"")
}

/// 把只读快照打印成文本
fn render(player: &StoryPlayer) {
    let view = player.view();
    println!("―――― [{}] ――――", view.node_id);

    if let Some(vn) = &view.vn {
        match &vn.speaker {
            Some(s) => println!("{s}：{}", vn.visible_text),
            None => println!("{}", vn.visible_text),
        }
        if vn.finished {
            println!("（脚本播放完毕）");
        }
    }

    if let Some(d) = &view.debate {
        println!(
            "证言 {}/{} - {}：",
            d.statement_index + 1,
            d.statement_count,
            d.speaker
        );
        for run in &d.runs {
            match run {
                trial_runtime::TextRun::Plain(t) => print!("{t}"),
                trial_runtime::TextRun::Sus { span_id, text } => print!("【{text}】({span_id})"),
            }
        }
        println!();
        if let Some(menu) = &d.menu {
            println!("▼ 反驳菜单 [{}]：", menu.span_id);
            for opt in &menu.options {
                println!("  - {} ({})", opt.label, opt.id);
            }
        }
    }

    if let Some(p) = &view.present {
        println!("{}", p.prompt);
        for item in &p.items {
            println!("  - {} ({})", item.label, item.id);
        }
    }

    if let Some(c) = &view.choice {
        for opt in &c.options {
            println!("  - {} ({})", opt.label, opt.id);
        }
    }

    if let Some(t) = &view.timers.node {
        println!("⏱ 剩余 {:.1} 秒", t.remain_sec);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let mut player = StoryPlayer::new(demo_graph()?, demo_loader());
    player.set_auto_mode(args.auto);
    player.set_time_scale(args.time_scale);
    player.set_effect_sink(|e| tracing::info!("效果: ({}, '{}')", e.kind, e.name));
    player.set_cue_sink(|name| tracing::info!("演出: '{name}'"));

    player.start("intro")?;
    render(&player);

    let stdin = io::stdin();
    let mut last_frame = Instant::now();

    loop {
        if player.is_chapter_end() {
            println!("=== 章节结束 ===");
            break;
        }

        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        // 把输入之间流逝的真实时间喂给计时器
        player.tick(last_frame.elapsed().as_secs_f64())?;
        last_frame = Instant::now();

        let mut parts = line.trim().splitn(2, ' ');
        let cmd = parts.next().unwrap_or("");
        let arg = parts.next().unwrap_or("").trim();

        match cmd {
            "" => player.advance()?,
            "ff" => player.fast_forward()?,
            "sus" => {
                if !player.open_suspicion(arg) {
                    println!("（点不开这个疑点）");
                }
            }
            "commit" => player.commit_option(arg)?,
            "pick" => player.pick_evidence(arg)?,
            "close" => player.close_debate_menu(),
            "quit" => break,
            other => println!("（未知指令 '{other}'）"),
        }

        render(&player);
    }

    Ok(())
}
