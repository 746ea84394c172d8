//! # Resource 模块
//!
//! 节点资源的数据模型与加载抽象。
//!
//! ## 设计说明
//!
//! - Runner 每次进入节点都**重新加载**资源，不做缓存
//! - 资源缺失或损坏在进入节点时即视为致命错误
//! - [`ResourceLoader`] 抽象加载来源：
//!   - `FsLoader`：从文件系统读取（开发模式）
//!   - `MemoryLoader`：内存中的路径 -> 内容表（测试与演示宿主）

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ResourceError;
use crate::script::{VnScript, parse_script};

/// 辩论证言
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// 说话者
    pub speaker: String,
    /// 证言文本（可内嵌 `{sus:...}` 疑点标记）
    pub text: String,
    /// 演出 id（可选，宿主用于播放证言动作）
    #[serde(default)]
    pub performance: Option<String>,
}

/// 菜单/选择里的一个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    /// 选项 id（作为 Option 事件的 key）
    #[serde(rename = "option_id")]
    pub id: String,
    /// 显示文本
    pub label: String,
}

/// 挂在某条证言某个疑点上的反驳菜单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDef {
    /// 所属证言下标
    pub statement_index: usize,
    /// 所属疑点 span id
    pub span_id: String,
    /// 反驳选项
    pub options: Vec<OptionEntry>,
}

/// 辩论节点资源
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateDef {
    /// 证言列表（播放顺序）
    pub statements: Vec<Statement>,
    /// 菜单列表，按 (statement_index, span_id) 定位
    #[serde(default)]
    pub menus: Vec<MenuDef>,
}

/// 举证节点里的一件证据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// 证据 id（作为 Pick 事件的 key）
    #[serde(rename = "item_id")]
    pub id: String,
    /// 显示文本
    pub label: String,
}

/// 举证节点资源
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentDef {
    /// 提问文本
    pub prompt: String,
    /// 可出示的证据
    pub items: Vec<EvidenceItem>,
}

/// 多项选择节点资源
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDef {
    /// 选项列表
    pub options: Vec<OptionEntry>,
}

/// 资源加载抽象
///
/// 所有方法接收节点上记录的资源路径，返回解析好的资源模型。
pub trait ResourceLoader {
    /// 加载 VN 脚本（文本格式）
    fn load_script(&self, path: &str) -> Result<VnScript, ResourceError>;

    /// 加载辩论定义（JSON）
    fn load_debate(&self, path: &str) -> Result<DebateDef, ResourceError>;

    /// 加载举证定义（JSON）
    fn load_present(&self, path: &str) -> Result<PresentDef, ResourceError>;

    /// 加载选择定义（JSON）
    fn load_choice(&self, path: &str) -> Result<ChoiceDef, ResourceError>;
}

/// 把已读到的文本内容解析为 VN 脚本
fn parse_script_content(path: &str, content: &str) -> Result<VnScript, ResourceError> {
    parse_script(content).map_err(|source| ResourceError::Script {
        path: path.to_string(),
        source,
    })
}

/// 把已读到的 JSON 内容反序列化为资源模型
fn parse_json_content<T: for<'de> Deserialize<'de>>(
    path: &str,
    content: &str,
) -> Result<T, ResourceError> {
    serde_json::from_str(content).map_err(|e| ResourceError::InvalidFormat {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// 文件系统资源加载器
#[derive(Debug, Clone)]
pub struct FsLoader {
    /// 资源根目录
    base_path: PathBuf,
}

impl FsLoader {
    /// 创建加载器
    ///
    /// # 参数
    /// - `base_path`: 资源根目录，节点上的资源路径相对于它解析
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn read(&self, path: &str) -> Result<String, ResourceError> {
        let full = self.base_path.join(path);
        std::fs::read_to_string(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound {
                    path: full.to_string_lossy().to_string(),
                }
            } else {
                ResourceError::LoadFailed {
                    path: full.to_string_lossy().to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}

impl ResourceLoader for FsLoader {
    fn load_script(&self, path: &str) -> Result<VnScript, ResourceError> {
        let content = self.read(path)?;
        parse_script_content(path, &content)
    }

    fn load_debate(&self, path: &str) -> Result<DebateDef, ResourceError> {
        let content = self.read(path)?;
        parse_json_content(path, &content)
    }

    fn load_present(&self, path: &str) -> Result<PresentDef, ResourceError> {
        let content = self.read(path)?;
        parse_json_content(path, &content)
    }

    fn load_choice(&self, path: &str) -> Result<ChoiceDef, ResourceError> {
        let content = self.read(path)?;
        parse_json_content(path, &content)
    }
}

/// 内存资源加载器
///
/// 路径 -> 文本内容的表，解析逻辑与 `FsLoader` 相同。
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    /// 创建空加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个文件（链式）
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// 注册一个文件
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    fn read(&self, path: &str) -> Result<&str, ResourceError> {
        self.files
            .get(path)
            .map(String::as_str)
            .ok_or_else(|| ResourceError::NotFound {
                path: path.to_string(),
            })
    }
}

impl ResourceLoader for MemoryLoader {
    fn load_script(&self, path: &str) -> Result<VnScript, ResourceError> {
        let content = self.read(path)?;
        parse_script_content(path, content)
    }

    fn load_debate(&self, path: &str) -> Result<DebateDef, ResourceError> {
        let content = self.read(path)?;
        parse_json_content(path, content)
    }

    fn load_present(&self, path: &str) -> Result<PresentDef, ResourceError> {
        let content = self.read(path)?;
        parse_json_content(path, content)
    }

    fn load_choice(&self, path: &str) -> Result<ChoiceDef, ResourceError> {
        let content = self.read(path)?;
        parse_json_content(path, content)
    }
}
