use std::collections::HashMap;

use super::editor::{DeleteRequest, EntryEditor, PendingWrite, SaveRequest};
use crate::error::{Result, SyncError};
use crate::models::{ConfigEntry, LoadStatus, Slot};

/// 一次列表加载的凭据。`generation` 单调递增，用于丢弃过期的加载结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub resource_id: String,
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 某个资源的配置项列表。只反映服务端确认过的状态，从不在本地原地修改。
///
/// 已有行的写状态记在 `in_flight` 里，按原始 key 索引。编辑器随每次加载重建、
/// 加载失败时整体清空，但进行中的写不会因此丢失。
pub struct EntryCollection {
    resource_id: String,
    entries: Vec<ConfigEntry>,
    status: LoadStatus,
    editors: Vec<EntryEditor>,
    new_entry: EntryEditor,
    in_flight: HashMap<String, PendingWrite>,
    issued: u64,
    applied: u64,
}

impl EntryCollection {
    pub fn new(resource_id: &str) -> Self {
        let resource_id = resource_id.trim().to_string();
        Self {
            new_entry: EntryEditor::new_entry(&resource_id),
            resource_id,
            entries: Vec::new(),
            status: LoadStatus::Idle,
            editors: Vec::new(),
            in_flight: HashMap::new(),
            issued: 0,
            applied: 0,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// 列表可用时才有行可以渲染
    pub fn is_available(&self) -> bool {
        self.status == LoadStatus::Ready
    }

    /// 已有配置项的编辑器，顺序与存储返回的一致
    pub fn editors(&self) -> &[EntryEditor] {
        &self.editors
    }

    pub fn new_entry_editor(&self) -> &EntryEditor {
        &self.new_entry
    }

    pub fn editor(&self, slot: &Slot) -> Option<&EntryEditor> {
        match slot {
            Slot::New => Some(&self.new_entry),
            Slot::Existing(key) => self.editors.iter().find(|e| e.original_key() == key),
        }
    }

    /// 只用于本地编辑；写操作走 [`EntryCollection::begin_save`] 等方法
    pub(crate) fn editor_mut(&mut self, slot: &Slot) -> Option<&mut EntryEditor> {
        match slot {
            Slot::New => Some(&mut self.new_entry),
            Slot::Existing(key) => self.editors.iter_mut().find(|e| e.original_key() == key),
        }
    }

    /// 某个已有 key 上正在进行的写，编辑器不存在时也有效
    pub fn pending_write(&self, key: &str) -> PendingWrite {
        self.in_flight.get(key).copied().unwrap_or_default()
    }

    pub fn begin_save(&mut self, slot: &Slot) -> Result<SaveRequest> {
        let request = self.row_mut(slot)?.begin_save()?;
        if let Slot::Existing(key) = slot {
            self.in_flight.insert(key.clone(), PendingWrite::Save);
        }
        Ok(request)
    }

    /// 保存完成，返回这一行当前是否还有编辑器
    pub fn finish_save(&mut self, slot: &Slot, succeeded: bool) -> bool {
        self.settle_write(slot, PendingWrite::Save);
        match self.editor_mut(slot) {
            Some(editor) => {
                editor.finish_save(succeeded);
                true
            }
            None => false,
        }
    }

    pub fn begin_delete(&mut self, slot: &Slot) -> Result<DeleteRequest> {
        let request = self.row_mut(slot)?.begin_delete()?;
        self.in_flight.insert(request.key.clone(), PendingWrite::Delete);
        Ok(request)
    }

    /// 删除完成，返回这一行当前是否还有编辑器
    pub fn finish_delete(&mut self, slot: &Slot) -> bool {
        self.settle_write(slot, PendingWrite::Delete);
        match self.editor_mut(slot) {
            Some(editor) => {
                editor.finish_delete();
                true
            }
            None => false,
        }
    }

    fn row_mut(&mut self, slot: &Slot) -> Result<&mut EntryEditor> {
        if let Slot::Existing(key) = slot {
            if self.pending_write(key) != PendingWrite::None {
                return Err(SyncError::WriteInFlight(key.clone()));
            }
        }
        self.editor_mut(slot).ok_or_else(|| SyncError::UnknownRow(slot.label().to_string()))
    }

    fn settle_write(&mut self, slot: &Slot, write: PendingWrite) {
        if let Slot::Existing(key) = slot {
            if self.in_flight.get(key) == Some(&write) {
                self.in_flight.remove(key);
            }
        }
    }

    /// 开始一次加载。没有资源 id 时直接跳过，状态保持 `Idle`。
    /// 已经就绪的列表在后台刷新期间保持 `Ready`，现有行继续可用。
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.resource_id.is_empty() {
            return None;
        }
        if self.status != LoadStatus::Ready {
            self.status = LoadStatus::Loading;
        }
        self.issued += 1;
        Some(LoadTicket {
            resource_id: self.resource_id.clone(),
            generation: self.issued,
        })
    }

    /// 应用加载结果，返回是否被采纳。比已采纳结果更旧的加载会被丢弃。
    ///
    /// 成功时整体替换快照并按 key 重建所有已有行的编辑器，未保存的草稿随之丢弃；
    /// 仍在进行中的写状态会带到同 key 的新编辑器上。新建编辑器不受影响。
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<ConfigEntry>>) -> bool {
        if ticket.resource_id != self.resource_id || ticket.generation <= self.applied {
            tracing::debug!(
                resource_id = %ticket.resource_id,
                generation = ticket.generation,
                applied = self.applied,
                "discarding stale entry load"
            );
            return false;
        }
        self.applied = ticket.generation;

        match result {
            Ok(entries) => {
                self.editors = entries
                    .iter()
                    .map(|entry| {
                        let mut editor = EntryEditor::for_entry(&self.resource_id, entry);
                        editor.inherit_pending(self.pending_write(&entry.key));
                        editor
                    })
                    .collect();
                tracing::debug!(
                    resource_id = %self.resource_id,
                    count = entries.len(),
                    "entries loaded"
                );
                self.entries = entries;
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                tracing::warn!(
                    resource_id = %self.resource_id,
                    in_flight = self.in_flight.len(),
                    "failed to load entries: {}",
                    e
                );
                self.entries.clear();
                self.editors.clear();
                self.status = LoadStatus::Error(e.to_string());
            }
        }
        true
    }
}
