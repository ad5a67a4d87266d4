pub mod graphql;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ConfigEntry, Resource};

pub use graphql::GraphqlStore;
pub use memory::MemoryStore;

/// 远端权威存储。客户端只持有按资源拉取的只读快照，所有写入都以这里为准。
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 查询父资源，不存在时返回 `Ok(None)`
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>>;

    /// 按存储返回的顺序列出配置项。实现必须绕过任何中间缓存。
    async fn list_entries(&self, resource_id: &str) -> Result<Vec<ConfigEntry>>;

    async fn set_entry(&self, resource_id: &str, key: &str, value: &str) -> Result<()>;

    async fn unset_entry(&self, resource_id: &str, key: &str) -> Result<()>;
}
