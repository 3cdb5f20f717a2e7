//! 配置模块，负责加载JSON配置文件
//!
//! 两类配置: 各管理页面的检索字段划分(精确匹配/时间区间), 以及
//! 实体名到数据库表名的映射。都支持从JSON文件加载, 失败时由调用方
//! 回退到内置默认值。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::search::DEFAULT_DATE_FIELDS;

/// 配置错误
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "配置错误: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 单个管理页面的检索字段划分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenFields {
    /// 精确匹配字段
    #[serde(default)]
    pub filter_fields: Vec<String>,
    /// createTime/updateTime 之外的时间区间字段
    #[serde(default)]
    pub extra_date_fields: Vec<String>,
}

/// 页面名称到检索字段划分的映射
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFieldConfig {
    #[serde(flatten)]
    pub screens: HashMap<String, ScreenFields>,
}

impl SearchFieldConfig {
    /// 从JSON文件加载检索字段配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref)
            .map_err(|e| ConfigError::new(format!(
                "无法读取配置文件 {}: {}",
                path_ref.display(),
                e
            )))?;

        let config: SearchFieldConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::new(format!(
                "无法解析JSON配置文件 {}: {}",
                path_ref.display(),
                e
            )))?;

        config.validate()?;
        Ok(config)
    }

    /// 校验: 同一页面的精确匹配字段不允许出现在时间区间字段集合中
    ///
    /// 描述符构建按"过滤字段优先"分类, 重叠的字段永远走不到时间分支,
    /// 在加载配置时直接拒绝这种写法。
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (screen, fields) in &self.screens {
            for key in &fields.filter_fields {
                let is_date = DEFAULT_DATE_FIELDS.contains(&key.as_str())
                    || fields.extra_date_fields.contains(key);
                if is_date {
                    return Err(ConfigError::new(format!(
                        "页面 {} 的字段 {} 同时出现在过滤字段与时间字段中",
                        screen, key
                    )));
                }
            }
        }
        Ok(())
    }

    /// 查询某个页面的字段划分, 未配置的页面返回空划分
    pub fn screen(&self, name: &str) -> ScreenFields {
        self.screens.get(name).cloned().unwrap_or_default()
    }

    /// 创建默认配置: 控制台的四个管理页面
    pub fn default() -> Self {
        let mut screens = HashMap::new();
        screens.insert(
            "user".to_string(),
            ScreenFields {
                filter_fields: vec!["gender".to_string(), "enable".to_string()],
                extra_date_fields: vec![],
            },
        );
        screens.insert(
            "role".to_string(),
            ScreenFields {
                filter_fields: vec!["enable".to_string()],
                extra_date_fields: vec![],
            },
        );
        screens.insert(
            "organization".to_string(),
            ScreenFields {
                filter_fields: vec!["enable".to_string()],
                extra_date_fields: vec![],
            },
        );
        screens.insert(
            "menu".to_string(),
            ScreenFields {
                filter_fields: vec!["enable".to_string(), "type".to_string()],
                extra_date_fields: vec![],
            },
        );
        Self { screens }
    }
}

/// 表映射配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMappingConfig {
    /// 实体名到数据库表名的映射
    #[serde(flatten)]
    pub mappings: HashMap<String, String>,
}

impl TableMappingConfig {
    /// 从JSON文件加载表映射配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref)
            .map_err(|e| ConfigError::new(format!(
                "无法读取配置文件 {}: {}",
                path_ref.display(),
                e
            )))?;

        let mappings: HashMap<String, String> = serde_json::from_str(&content)
            .map_err(|e| ConfigError::new(format!(
                "无法解析JSON配置文件 {}: {}",
                path_ref.display(),
                e
            )))?;

        Ok(TableMappingConfig { mappings })
    }

    /// 获取实体对应的表名，如果不存在则返回小写的实体名
    pub fn get_table_name(&self, entity: &str) -> String {
        self.mappings
            .get(entity)
            .cloned()
            .unwrap_or_else(|| entity.to_lowercase())
    }

    /// 获取所有映射
    pub fn get_mappings(&self) -> &HashMap<String, String> {
        &self.mappings
    }

    /// 创建默认配置: 控制台的系统表
    pub fn default() -> Self {
        let mut mappings = HashMap::new();
        mappings.insert("User".to_string(), "sys_user".to_string());
        mappings.insert("Role".to_string(), "sys_role".to_string());
        mappings.insert("Organization".to_string(), "sys_organization".to_string());
        mappings.insert("Menu".to_string(), "sys_menu".to_string());

        Self { mappings }
    }
}
