//! # ChoiceRunner 模块
//!
//! 多项选择节点：静态选项列表，选中命中的选项产生 Option 事件。

use tracing::debug;

use crate::graph::GraphEvent;
use crate::resource::{ChoiceDef, OptionEntry};

/// 多项选择状态机
#[derive(Debug)]
pub struct ChoiceRunner {
    def: ChoiceDef,
}

impl ChoiceRunner {
    /// 进入节点
    pub fn enter(def: ChoiceDef) -> Self {
        Self { def }
    }

    /// 选择某个选项
    ///
    /// id 在列表中时返回 Option 事件，否则是 no-op。
    pub fn choose(&self, option_id: &str) -> Option<GraphEvent> {
        if self.def.options.iter().any(|o| o.id == option_id) {
            Some(GraphEvent::option(option_id))
        } else {
            debug!("没有选项 '{option_id}'，忽略选择");
            None
        }
    }

    /// 选项列表
    pub fn options(&self) -> &[OptionEntry] {
        &self.def.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose() {
        let r = ChoiceRunner::enter(ChoiceDef {
            options: vec![
                OptionEntry {
                    id: "opt_yes".to_string(),
                    label: "异议！".to_string(),
                },
                OptionEntry {
                    id: "opt_no".to_string(),
                    label: "保持沉默".to_string(),
                },
            ],
        });

        assert_eq!(r.choose("opt_yes"), Some(GraphEvent::option("opt_yes")));
        assert!(r.choose("opt_maybe").is_none());
    }
}
