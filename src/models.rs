use serde::{Deserialize, Serialize};

/// 配置项（环境变量），key 在同一资源内唯一
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 拥有配置项的父资源（应用）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub name: String,
}

/// 配置项列表的加载状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// 尚未发起过加载（没有选中资源）
    Idle,
    Loading,
    Ready,
    Error(String),
}

/// 页面上一行编辑器的定位：已有配置项按 key，新建编辑器单独一个
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Existing(String),
    New,
}

impl Slot {
    pub fn existing(key: impl Into<String>) -> Self {
        Slot::Existing(key.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Slot::Existing(key) => key,
            Slot::New => "<new>",
        }
    }
}
