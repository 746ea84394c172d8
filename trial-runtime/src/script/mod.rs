//! # Script 模块
//!
//! VN 脚本的数据模型与文本解析。
//!
//! ## 模块结构
//!
//! - `ast`: 脚本命令模型（台词 / 演出标记）
//! - `parser`: 行式文本解析器（手写，无 regex 依赖）

mod ast;
mod parser;

pub use ast::{VnCommand, VnScript};
pub use parser::parse_script;
