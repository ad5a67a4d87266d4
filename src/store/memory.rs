use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use super::RemoteStore;
use crate::error::{Result, SyncError};
use crate::models::{ConfigEntry, Resource};

/// 存储操作类型，用于失败注入和调用记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetResource,
    ListEntries,
    SetEntry,
    UnsetEntry,
}

/// 一次存储调用的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetResource(String),
    ListEntries(String),
    SetEntry(String, String, String),
    UnsetEntry(String, String),
}

/// 挂起点：被挂起的调用照常执行，但在返回前停住，直到 [`Hold::release`]
#[derive(Clone, Default)]
pub struct Hold {
    reached: Arc<Notify>,
    release: Arc<Notify>,
}

impl Hold {
    /// 等到被挂起的调用已经执行完、正停在返回之前
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn park(&self) {
        self.reached.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
struct MemoryState {
    resources: Vec<(Resource, Vec<ConfigEntry>)>,
    failures: HashMap<StoreOp, VecDeque<String>>,
    holds: HashMap<StoreOp, VecDeque<Hold>>,
    calls: Vec<StoreCall>,
}

/// 进程内存储：按插入顺序保存配置项。支持一次性失败注入，便于嵌入和测试。
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个资源及其初始配置项
    pub async fn insert_resource(&self, resource: Resource, entries: Vec<ConfigEntry>) {
        let mut state = self.state.lock().await;
        state.resources.retain(|(r, _)| r.id != resource.id);
        state.resources.push((resource, entries));
    }

    /// 让下一次 `op` 调用以 `message` 失败
    pub async fn fail_next(&self, op: StoreOp, message: impl Into<String>) {
        self.state
            .lock()
            .await
            .failures
            .entry(op)
            .or_default()
            .push_back(message.into());
    }

    /// 挂起下一次 `op` 调用，见 [`Hold`]
    pub async fn hold_next(&self, op: StoreOp) -> Hold {
        let hold = Hold::default();
        self.state
            .lock()
            .await
            .holds
            .entry(op)
            .or_default()
            .push_back(hold.clone());
        hold
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn entries(&self, resource_id: &str) -> Option<Vec<ConfigEntry>> {
        let state = self.state.lock().await;
        state
            .resources
            .iter()
            .find(|(r, _)| r.id == resource_id)
            .map(|(_, entries)| entries.clone())
    }
}

impl MemoryStore {
    /// 在锁内执行一次调用；若该操作被挂起，释放锁之后再等待
    async fn call<T>(
        &self,
        op: StoreOp,
        call: StoreCall,
        run: impl FnOnce(&mut MemoryState) -> Result<T>,
    ) -> Result<T> {
        let (result, hold) = {
            let mut state = self.state.lock().await;
            let hold = state.holds.get_mut(&op).and_then(|q| q.pop_front());
            let result = match state.record(op, call) {
                Ok(()) => run(&mut *state),
                Err(e) => Err(e),
            };
            (result, hold)
        };
        if let Some(hold) = hold {
            hold.park().await;
        }
        result
    }
}

impl MemoryState {
    /// 记录调用，并取出为该操作注入的失败
    fn record(&mut self, op: StoreOp, call: StoreCall) -> Result<()> {
        self.calls.push(call);
        match self.failures.get_mut(&op).and_then(|q| q.pop_front()) {
            Some(message) => Err(SyncError::Rejected(message)),
            None => Ok(()),
        }
    }

    fn entries_mut(&mut self, resource_id: &str) -> Result<&mut Vec<ConfigEntry>> {
        self.resources
            .iter_mut()
            .find(|(r, _)| r.id == resource_id)
            .map(|(_, entries)| entries)
            .ok_or_else(|| SyncError::Rejected(format!("app not found: {}", resource_id)))
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>> {
        let call = StoreCall::GetResource(resource_id.to_string());
        self.call(StoreOp::GetResource, call, |state| {
            Ok(state
                .resources
                .iter()
                .find(|(r, _)| r.id == resource_id)
                .map(|(r, _)| r.clone()))
        })
        .await
    }

    async fn list_entries(&self, resource_id: &str) -> Result<Vec<ConfigEntry>> {
        let call = StoreCall::ListEntries(resource_id.to_string());
        self.call(StoreOp::ListEntries, call, |state| {
            Ok(state.entries_mut(resource_id)?.clone())
        })
        .await
    }

    async fn set_entry(&self, resource_id: &str, key: &str, value: &str) -> Result<()> {
        let call = StoreCall::SetEntry(resource_id.to_string(), key.to_string(), value.to_string());
        self.call(StoreOp::SetEntry, call, |state| {
            let entries = state.entries_mut(resource_id)?;
            match entries.iter_mut().find(|e| e.key == key) {
                Some(entry) => entry.value = value.to_string(),
                None => entries.push(ConfigEntry::new(key, value)),
            }
            Ok(())
        })
        .await
    }

    async fn unset_entry(&self, resource_id: &str, key: &str) -> Result<()> {
        let call = StoreCall::UnsetEntry(resource_id.to_string(), key.to_string());
        self.call(StoreOp::UnsetEntry, call, |state| {
            state.entries_mut(resource_id)?.retain(|e| e.key != key);
            Ok(())
        })
        .await
    }
}
