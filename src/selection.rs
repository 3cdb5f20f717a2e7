//! 角色赋权的三态选择模型
//!
//! 菜单赋权对话框里的勾选状态在这里以纯值对象维护:
//! `SelectionState` 记录全选/半选两个Id集合, `PermissionTree` 基于树结构
//! 提供 load/toggle/flatten 等无副作用的状态转移。保存时的载荷就是
//! 全选与半选Id的并集, 后端按叶子Id重建实际授权。

use std::collections::{HashMap, HashSet};

use crate::tree::TreeNode;

/// 三态选择的值对象
///
/// 不变式: 一个节点要么在 `checked`, 要么在 `indeterminate`, 不会同时在两边;
/// 内部节点的子孙叶子全部选中时它在 `checked`, 部分选中时在 `indeterminate`。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    checked: HashSet<String>,
    indeterminate: HashSet<String>,
}

impl SelectionState {
    pub fn is_checked(&self, id: &str) -> bool {
        self.checked.contains(id)
    }

    pub fn is_indeterminate(&self, id: &str) -> bool {
        self.indeterminate.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.checked.is_empty() && self.indeterminate.is_empty()
    }

    /// 展平为持久化载荷: 全选与半选Id的并集, 顺序不保证
    pub fn flatten(&self) -> Vec<String> {
        self.checked
            .iter()
            .chain(self.indeterminate.iter())
            .cloned()
            .collect()
    }

    /// 展平为集合, 便于比较两次展平结果
    pub fn flatten_set(&self) -> HashSet<String> {
        self.checked
            .union(&self.indeterminate)
            .cloned()
            .collect()
    }
}

struct NodeMeta {
    children: Vec<String>,
}

/// 赋权树: 对一棵可赋权条目树建立索引, 驱动三态选择的状态转移
///
/// `linkage` 对应树形控件的级联开关: 关闭后 toggle 只翻转当前节点自身,
/// 不再向子孙与祖先传播。
pub struct PermissionTree {
    meta: HashMap<String, NodeMeta>,
    /// 后序遍历得到的自底向上顺序, 推导祖先状态时按此扫描
    bottom_up: Vec<String>,
    linkage: bool,
}

impl PermissionTree {
    pub fn new(nodes: &[TreeNode]) -> Self {
        let mut meta = HashMap::new();
        let mut bottom_up = Vec::new();
        index_nodes(nodes, &mut meta, &mut bottom_up);
        Self {
            meta,
            bottom_up,
            linkage: true,
        }
    }

    pub fn linkage(&self) -> bool {
        self.linkage
    }

    pub fn set_linkage(&mut self, linkage: bool) {
        self.linkage = linkage;
    }

    pub fn contains(&self, id: &str) -> bool {
        self.meta.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// 由后端返回的已授权Id列表初始化选择状态
    ///
    /// 树中不存在的Id直接忽略; 内部节点的三态由子节点自底向上推导,
    /// 重复加载同一批Id得到相同的状态。
    pub fn load_selection(&self, granted: &[String]) -> SelectionState {
        let mut state = SelectionState::default();
        for id in granted {
            if self.meta.contains_key(id.as_str()) {
                state.checked.insert(id.clone());
            }
        }
        self.derive(&mut state);
        state
    }

    /// 勾选/取消一个节点, 返回新的选择状态
    ///
    /// 级联开启时: 勾选向整棵子树传播, 祖先状态按不变式重新推导;
    /// 级联关闭时只翻转该节点。未知Id原样返回。
    pub fn toggle(&self, state: &SelectionState, id: &str, checked: bool) -> SelectionState {
        if !self.meta.contains_key(id) {
            return state.clone();
        }
        let mut next = state.clone();
        if self.linkage {
            self.mark_subtree(&mut next, id, checked);
            self.derive(&mut next);
        } else {
            next.indeterminate.remove(id);
            if checked {
                next.checked.insert(id.to_string());
            } else {
                next.checked.remove(id);
            }
        }
        next
    }

    /// 全选整棵树
    pub fn select_all(&self) -> SelectionState {
        let mut state = SelectionState::default();
        for id in self.meta.keys() {
            state.checked.insert(id.clone());
        }
        self.derive(&mut state);
        state
    }

    /// 清空选择
    pub fn clear(&self) -> SelectionState {
        SelectionState::default()
    }

    fn mark_subtree(&self, state: &mut SelectionState, id: &str, checked: bool) {
        state.indeterminate.remove(id);
        if checked {
            state.checked.insert(id.to_string());
        } else {
            state.checked.remove(id);
        }
        for child in &self.meta[id].children {
            self.mark_subtree(state, child, checked);
        }
    }

    /// 自底向上推导内部节点的三态
    ///
    /// 子节点全部选中 → 选中; 存在选中或半选的子节点 → 半选; 否则未选。
    /// 内部节点的直接标记不保留, 它的状态完全由叶子决定。
    fn derive(&self, state: &mut SelectionState) {
        state.indeterminate.clear();
        for id in &self.bottom_up {
            let children = &self.meta[id].children;
            if children.is_empty() {
                continue;
            }
            state.checked.remove(id);
            let all = children.iter().all(|c| state.checked.contains(c));
            let any = children
                .iter()
                .any(|c| state.checked.contains(c) || state.indeterminate.contains(c));
            if all {
                state.checked.insert(id.clone());
            } else if any {
                state.indeterminate.insert(id.clone());
            }
        }
    }
}

fn index_nodes(
    nodes: &[TreeNode],
    meta: &mut HashMap<String, NodeMeta>,
    bottom_up: &mut Vec<String>,
) {
    for node in nodes {
        let children = match &node.children {
            Some(children) => {
                index_nodes(children, meta, bottom_up);
                children.iter().map(|c| c.id.clone()).collect()
            }
            None => Vec::new(),
        };
        meta.insert(node.id.clone(), NodeMeta { children });
        bottom_up.push(node.id.clone());
    }
}
