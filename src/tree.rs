//! 树形结构模型与递归过滤
//!
//! 后端的菜单树/机构树返回后在客户端做二次筛选：保留满足谓词的节点,
//! 以及通往这些节点的全部祖先路径, 供"上级菜单"之类的受限选择器使用。

use serde::{Deserialize, Serialize};

/// 顶级节点的父Id哨兵值
pub const ROOT_PARENT_ID: &str = "0";

/// 开放的类型标记, 例如菜单类型 `{"id": "Function", "name": "功能"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeTag {
    pub id: String,
    pub name: String,
}

impl TypeTag {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// 树节点, 对应后端树形响应中的一条记录
///
/// `children` 为 `None` 表示该节点没有 children 属性,
/// 树形控件以此区分真正的叶子和被过滤空的分支。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,
    /// 父节点Id, 顶级节点为 "0"
    pub parent_id: String,
    /// 显示名称
    pub name: String,
    /// 节点类型, 具体判别交给调用方的谓词
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    /// 子节点, 插入顺序即显示顺序
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT_ID
    }
}

/// 按谓词递归过滤一批同级节点, 返回全新的树, 不修改输入
///
/// 节点保留的条件: 自身满足谓词, 或者过滤后仍有保留的子节点。
/// 同级节点的相对顺序保持不变。
pub fn filter_tree<F>(nodes: &[TreeNode], predicate: &F) -> Vec<TreeNode>
where
    F: Fn(&TreeNode) -> bool,
{
    nodes
        .iter()
        .filter_map(|node| filter_node(node, predicate))
        .collect()
}

/// 过滤单个节点: 先递归过滤子树, 再判定节点本身
///
/// 子节点全部被过滤掉时移除 children 属性, 而不是留下空序列。
pub fn filter_node<F>(node: &TreeNode, predicate: &F) -> Option<TreeNode>
where
    F: Fn(&TreeNode) -> bool,
{
    let children = match &node.children {
        Some(existing) if !existing.is_empty() => {
            let kept = filter_tree(existing, predicate);
            if kept.is_empty() {
                None
            } else {
                Some(kept)
            }
        }
        other => other.clone(),
    };
    let candidate = TreeNode {
        id: node.id.clone(),
        parent_id: node.parent_id.clone(),
        name: node.name.clone(),
        type_tag: node.type_tag.clone(),
        children,
    };
    if predicate(&candidate) || candidate.children.as_ref().is_some_and(|c| !c.is_empty()) {
        Some(candidate)
    } else {
        None
    }
}

/// 深度优先收集整棵树的全部节点Id
pub fn key_list(nodes: &[TreeNode]) -> Vec<String> {
    let mut ids = Vec::new();
    collect_keys(nodes, &mut ids);
    ids
}

fn collect_keys(nodes: &[TreeNode], ids: &mut Vec<String>) {
    for node in nodes {
        ids.push(node.id.clone());
        if let Some(children) = &node.children {
            collect_keys(children, ids);
        }
    }
}
