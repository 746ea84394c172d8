//! # PresentRunner 模块
//!
//! 举证节点：静态的提问 + 证据列表，出示命中的证据产生 Pick 事件。

use tracing::debug;

use crate::graph::GraphEvent;
use crate::resource::{EvidenceItem, PresentDef};

/// 举证状态机
#[derive(Debug)]
pub struct PresentRunner {
    def: PresentDef,
}

impl PresentRunner {
    /// 进入节点
    pub fn enter(def: PresentDef) -> Self {
        Self { def }
    }

    /// 出示证据
    ///
    /// id 在列表中时返回 Pick 事件，否则是 no-op。
    pub fn pick(&self, item_id: &str) -> Option<GraphEvent> {
        if self.def.items.iter().any(|i| i.id == item_id) {
            Some(GraphEvent::pick(item_id))
        } else {
            debug!("没有证据 '{item_id}'，忽略出示");
            None
        }
    }

    /// 提问文本
    pub fn prompt(&self) -> &str {
        &self.def.prompt
    }

    /// 证据列表
    pub fn items(&self) -> &[EvidenceItem] {
        &self.def.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PresentRunner {
        PresentRunner::enter(PresentDef {
            prompt: "出示矛盾的证据！".to_string(),
            items: vec![
                EvidenceItem {
                    id: "evid_knife".to_string(),
                    label: "水果刀".to_string(),
                },
                EvidenceItem {
                    id: "evid_photo".to_string(),
                    label: "现场照片".to_string(),
                },
            ],
        })
    }

    #[test]
    fn test_pick_known_item() {
        let r = sample();
        assert_eq!(r.pick("evid_photo"), Some(GraphEvent::pick("evid_photo")));
    }

    #[test]
    fn test_pick_unknown_item_is_noop() {
        let r = sample();
        assert!(r.pick("evid_x").is_none());
    }
}
