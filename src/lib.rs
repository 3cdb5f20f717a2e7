//! 管理控制台的数据处理核心
//!
//! 三个相互独立的组件: 树形结构过滤([`tree`])、角色赋权的三态选择
//! ([`selection`])、检索表单到查询描述符的归一化([`search`]),
//! 外加把描述符编译为列表SQL的[`sql_compiler`]与JSON配置加载([`config`])。

pub mod tree;
pub mod selection;
pub mod search;
pub mod sql_compiler;
pub mod config;
