//! # Error 模块
//!
//! 定义 trial-runtime 中使用的错误类型。
//!
//! ## 分层
//!
//! - 结构性错误（节点不存在、资源缺失/损坏）：通过 `Result` 向上传播，
//!   预期在应用边界终止会话
//! - 语义性 no-op（无匹配边、选项 id 不存在等）：**不是错误**，
//!   由各组件静默吞掉并记录日志
//! - 标记子语言解析失败（`MarkupError`）：作为返回值交给调用方，
//!   调用方退回纯文本渲染

use thiserror::Error;

/// VN 脚本文本解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// 无效的行格式
    #[error("第 {line} 行：无效的格式 - {message}")]
    InvalidLine { line: usize, message: String },
}

/// 台词标记子语言（`{sus:...}` span）解析错误
///
/// 注意：此错误不会向上传播为致命错误。
/// 调用方收到错误后应把整段输入当作纯文本处理。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkupError {
    /// `{sus:` 标签未闭合
    #[error("未闭合的 {{sus:}} 标签")]
    Unterminated,

    /// span id 为空
    #[error("span id 为空")]
    EmptySpanId,

    /// 同一段文本内 span id 重复
    #[error("span id 重复: '{span_id}'")]
    DuplicateSpanId { span_id: String },

    /// span 内部出现嵌套的 `{sus:` 标签
    #[error("span '{span_id}' 内部出现嵌套标签")]
    NestedSpan { span_id: String },
}

/// 剧情图构建/校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// 节点 id 重复
    #[error("节点 id 重复: '{id}'")]
    DuplicateNode { id: String },

    /// 边的端点引用了不存在的节点
    #[error("边 '{from}' -> '{to}' 引用了不存在的节点")]
    UnknownEndpoint { from: String, to: String },

    /// Option/Pick 边缺少 key
    #[error("节点 '{from}' 的 {trigger} 边缺少 key")]
    MissingEdgeKey { from: String, trigger: String },

    /// 同一节点存在两条相同 (trigger, key) 的出边
    #[error("节点 '{from}' 存在歧义转移: ({trigger}, '{key}')")]
    AmbiguousTransition {
        from: String,
        trigger: String,
        key: String,
    },

    /// 章节终点节点不允许有出边
    #[error("章节终点节点 '{id}' 不允许有出边")]
    TerminalOutgoing { id: String },
}

/// 资源加载错误
///
/// Runner 进入节点时同步加载资源，缺失或损坏视为致命错误。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// 资源未找到
    #[error("资源未找到: {path}")]
    NotFound { path: String },

    /// 资源读取失败
    #[error("资源读取失败: {path} - {message}")]
    LoadFailed { path: String, message: String },

    /// 资源格式无效（JSON 反序列化失败等）
    #[error("无效的资源格式: {path} - {message}")]
    InvalidFormat { path: String, message: String },

    /// VN 脚本解析失败
    #[error("脚本解析失败: {path} - {source}")]
    Script {
        path: String,
        #[source]
        source: ScriptError,
    },
}

/// 运行时致命错误
///
/// 这些分支在剧情图经过校验的前提下应当不可达，属于防御性检查。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 节点不存在
    #[error("节点 '{id}' 不存在")]
    NodeNotFound { id: String },

    /// 节点类型无法播放
    #[error("节点 '{id}' 的类型无法播放")]
    UnsupportedNode { id: String },
}

/// trial-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoryError {
    /// 剧情图错误
    #[error("剧情图错误: {0}")]
    Graph(#[from] GraphError),

    /// 资源错误
    #[error("资源错误: {0}")]
    Resource(#[from] ResourceError),

    /// 运行时错误
    #[error("运行时错误: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Result 类型别名
pub type StoryResult<T> = Result<T, StoryError>;
