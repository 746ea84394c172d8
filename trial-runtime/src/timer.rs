//! # Timer 模块
//!
//! 倒计时值对象与三个互相独立的计时器。
//!
//! ## 共同策略
//!
//! - `remain_sec -= dt`（dt 已被 Player 按全局时间倍率缩放），钳制在 0
//! - `active` 恰好在归零的那一次 tick 变为 false
//! - 重新装填由各自的 key 变化触发，完全重置时长与激活状态
//!
//! ## 三个计时器
//!
//! - [`NodeTimer`]：节点限时（key = 节点 id），只为同时携带
//!   `time_limit_sec` 和 `be_node` 的辩论节点装填
//! - [`StatementTimer`]：证言自动推进（key = 证言下标）
//! - [`VnAutoTimer`]：台词自动推进（key = 台词序号；仅在 auto 模式下生效）

use serde::Serialize;

use crate::markup::parse_markup;

/// 阅读速度（字符/秒），用于估算证言与台词的停留时长
const READ_CHARS_PER_SEC: f64 = 12.0;
/// 估算时长下限（秒）
const READ_MIN_SEC: f64 = 2.0;
/// 估算时长上限（秒）
const READ_MAX_SEC: f64 = 10.0;

/// 估算一段文本的阅读时长
///
/// 先剥去疑点标记（解析失败则按纯文本计），
/// 按字符数 / 阅读速度折算，并钳制在 [下限, 上限] 区间。
pub fn reading_time(text: &str) -> f64 {
    let chars = match parse_markup(text) {
        Ok(m) => m.plain.chars().count(),
        Err(_) => text.chars().count(),
    };
    (chars as f64 / READ_CHARS_PER_SEC).clamp(READ_MIN_SEC, READ_MAX_SEC)
}

/// 倒计时值对象
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Countdown {
    /// 是否在走
    pub active: bool,
    /// 总时长（秒）
    pub total_sec: f64,
    /// 剩余时长（秒）
    pub remain_sec: f64,
}

impl Countdown {
    /// 创建未装填的倒计时
    pub fn idle() -> Self {
        Self::default()
    }

    /// 装填并开始
    pub fn arm(&mut self, total_sec: f64) {
        self.active = total_sec > 0.0;
        self.total_sec = total_sec;
        self.remain_sec = total_sec;
    }

    /// 解除
    pub fn disarm(&mut self) {
        self.active = false;
        self.total_sec = 0.0;
        self.remain_sec = 0.0;
    }

    /// 推进倒计时
    ///
    /// # 返回
    ///
    /// 恰好在本次 tick 归零时返回 true（之后不再返回 true）。
    pub fn tick(&mut self, dt_sec: f64) -> bool {
        if !self.active {
            return false;
        }
        self.remain_sec -= dt_sec;
        if self.remain_sec <= 0.0 {
            self.remain_sec = 0.0;
            self.active = false;
            return true;
        }
        false
    }
}

/// 节点限时计时器
///
/// 只为同时携带 `time_limit_sec` 和 `be_node` 的辩论节点装填；
/// key（节点 id）不变时重复同步不会重新装填。
#[derive(Debug, Clone, Default)]
pub struct NodeTimer {
    countdown: Countdown,
    armed_node: Option<String>,
}

impl NodeTimer {
    /// 按当前节点同步装填状态
    ///
    /// # 参数
    /// - `node_id`: 当前节点 id
    /// - `limit`: 节点限时（`None` 表示该节点不限时，计时器清空）
    pub fn sync(&mut self, node_id: &str, limit: Option<f64>) {
        let Some(total) = limit else {
            self.countdown.disarm();
            self.armed_node = None;
            return;
        };
        // 同一节点持续 tick 不重复装填
        if self.armed_node.as_deref() == Some(node_id) {
            return;
        }
        self.armed_node = Some(node_id.to_string());
        self.countdown.arm(total);
    }

    /// 推进，恰好归零时返回 true
    pub fn tick(&mut self, dt_sec: f64) -> bool {
        self.countdown.tick(dt_sec)
    }

    /// 倒计时快照
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }
}

/// 证言自动推进计时器
#[derive(Debug, Clone, Default)]
pub struct StatementTimer {
    countdown: Countdown,
    statement: Option<usize>,
}

impl StatementTimer {
    /// 按当前证言下标同步，下标变化时按给定时长重新装填
    pub fn sync(&mut self, statement_index: usize, duration_sec: f64) {
        if self.statement == Some(statement_index) {
            return;
        }
        self.statement = Some(statement_index);
        self.countdown.arm(duration_sec);
    }

    /// 清空（离开辩论节点时）
    pub fn clear(&mut self) {
        self.countdown.disarm();
        self.statement = None;
    }

    /// 推进，恰好归零时返回 true
    pub fn tick(&mut self, dt_sec: f64) -> bool {
        self.countdown.tick(dt_sec)
    }

    /// 倒计时快照
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }
}

/// 台词自动推进计时器
///
/// key 是台词序号而不是节点 id：一个 VN 节点内有多句台词。
/// 倒计时始终在走，但只有 auto 模式开启时 Player 才会据此推进。
#[derive(Debug, Clone, Default)]
pub struct VnAutoTimer {
    countdown: Countdown,
    line_serial: Option<u64>,
}

impl VnAutoTimer {
    /// 按当前台词序号同步，序号变化时按给定时长重新装填
    pub fn sync(&mut self, line_serial: u64, duration_sec: f64) {
        if self.line_serial == Some(line_serial) {
            return;
        }
        self.line_serial = Some(line_serial);
        self.countdown.arm(duration_sec);
    }

    /// 清空（离开 VN 节点时）
    pub fn clear(&mut self) {
        self.countdown.disarm();
        self.line_serial = None;
    }

    /// 推进，恰好归零时返回 true
    pub fn tick(&mut self, dt_sec: f64) -> bool {
        self.countdown.tick(dt_sec)
    }

    /// 倒计时快照
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_expires_exactly_once() {
        let mut c = Countdown::idle();
        c.arm(1.0);
        assert!(c.active);

        assert!(!c.tick(0.5));
        assert!(c.tick(0.6)); // 跨过 0 的这一次返回 true
        assert!(!c.active);
        assert_eq!(c.remain_sec, 0.0);
        assert!(!c.tick(1.0)); // 之后不再触发
    }

    #[test]
    fn test_countdown_clamped_at_zero() {
        let mut c = Countdown::idle();
        c.arm(0.3);
        c.tick(10.0);
        assert_eq!(c.remain_sec, 0.0);
    }

    #[test]
    fn test_node_timer_no_rearm_on_same_node() {
        let mut t = NodeTimer::default();
        t.sync("debate_1", Some(5.0));
        t.tick(3.0);
        assert!((t.countdown().remain_sec - 2.0).abs() < 1e-9);

        // 同一节点再次同步不会重置
        t.sync("debate_1", Some(5.0));
        assert!((t.countdown().remain_sec - 2.0).abs() < 1e-9);

        // 不同节点会重新装填
        t.sync("debate_2", Some(8.0));
        assert_eq!(t.countdown().remain_sec, 8.0);
    }

    #[test]
    fn test_node_timer_cleared_without_limit() {
        let mut t = NodeTimer::default();
        t.sync("debate_1", Some(5.0));
        t.sync("vn_1", None);
        assert!(!t.countdown().active);

        // 清空后重入同一辩论节点会重新装填
        t.sync("debate_1", Some(5.0));
        assert!(t.countdown().active);
        assert_eq!(t.countdown().remain_sec, 5.0);
    }

    #[test]
    fn test_statement_timer_rearms_on_index_change() {
        let mut t = StatementTimer::default();
        t.sync(0, 3.0);
        t.tick(1.0);
        t.sync(0, 3.0); // 下标不变，不重置
        assert!((t.countdown().remain_sec - 2.0).abs() < 1e-9);

        t.sync(1, 4.0);
        assert_eq!(t.countdown().remain_sec, 4.0);
    }

    #[test]
    fn test_vn_auto_timer_keyed_by_serial() {
        let mut t = VnAutoTimer::default();
        t.sync(1, 2.0);
        assert!(t.tick(2.5));
        // 序号不变时不重新装填，保持 inert
        t.sync(1, 2.0);
        assert!(!t.countdown().active);
        // 新台词重新装填
        t.sync(2, 2.0);
        assert!(t.countdown().active);
    }

    #[test]
    fn test_reading_time_clamped() {
        // 极短文本取下限
        assert_eq!(reading_time("短"), READ_MIN_SEC);
        // 极长文本取上限
        let long = "字".repeat(500);
        assert_eq!(reading_time(&long), READ_MAX_SEC);
        // 中间区间按字符数折算
        let mid = "字".repeat(60);
        assert!((reading_time(&mid) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_reading_time_strips_markup() {
        let with_markup = "{sus:q1}十个字十个字十个字十{/sus}";
        let plain = "十个字十个字十个字十";
        assert_eq!(reading_time(with_markup), reading_time(plain));
    }
}
