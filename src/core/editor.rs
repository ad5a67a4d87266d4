use crate::error::{Result, SyncError};
use crate::models::{ConfigEntry, Slot};

/// 隐藏模式下每个字符显示为一个圆点
pub const MASK_CHAR: char = '•';

/// 一行上正在进行的写操作。同一行同一时刻最多一个写操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingWrite {
    #[default]
    None,
    Save,
    Delete,
}

/// 保存请求：写入 `(key, value)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub resource_id: String,
    pub key: String,
    pub value: String,
}

/// 删除请求：按编辑器创建时的 key 删除
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub resource_id: String,
    pub key: String,
}

/// 单个配置项的编辑器：持有草稿、可见性和本行的写状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryEditor {
    resource_id: String,
    original_key: String,
    draft_key: String,
    draft_value: String,
    value_visible: bool,
    is_new: bool,
    pending: PendingWrite,
}

impl EntryEditor {
    /// 为已有配置项创建编辑器，草稿取自服务端的值
    pub fn for_entry(resource_id: &str, entry: &ConfigEntry) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            original_key: entry.key.clone(),
            draft_key: entry.key.clone(),
            draft_value: entry.value.clone(),
            value_visible: false,
            is_new: false,
            pending: PendingWrite::None,
        }
    }

    /// 新建模式的编辑器，草稿为空
    pub fn new_entry(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            original_key: String::new(),
            draft_key: String::new(),
            draft_value: String::new(),
            value_visible: false,
            is_new: true,
            pending: PendingWrite::None,
        }
    }

    pub fn slot(&self) -> Slot {
        if self.is_new {
            Slot::New
        } else {
            Slot::Existing(self.original_key.clone())
        }
    }

    pub fn original_key(&self) -> &str {
        &self.original_key
    }

    pub fn draft_key(&self) -> &str {
        &self.draft_key
    }

    pub fn draft_value(&self) -> &str {
        &self.draft_value
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_value_visible(&self) -> bool {
        self.value_visible
    }

    pub fn is_saving(&self) -> bool {
        self.pending == PendingWrite::Save
    }

    pub fn is_deleting(&self) -> bool {
        self.pending == PendingWrite::Delete
    }

    pub fn pending(&self) -> PendingWrite {
        self.pending
    }

    pub fn can_save(&self) -> bool {
        self.pending == PendingWrite::None
    }

    pub fn can_delete(&self) -> bool {
        !self.is_new && self.pending == PendingWrite::None
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.draft_key = key.into();
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.draft_value = value.into();
    }

    /// 纯本地操作，不触发任何请求
    pub fn toggle_visibility(&mut self) {
        self.value_visible = !self.value_visible;
    }

    /// 渲染用的值：隐藏时按字符数显示圆点，但草稿本身仍可编辑
    pub fn display_value(&self) -> String {
        if self.value_visible {
            self.draft_value.clone()
        } else {
            std::iter::repeat(MASK_CHAR)
                .take(self.draft_value.chars().count())
                .collect()
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_new {
            "Add"
        } else {
            "Save"
        }
    }

    /// 进入保存状态并生成请求。本行已有写操作时拒绝。
    pub fn begin_save(&mut self) -> Result<SaveRequest> {
        self.ensure_idle()?;
        self.pending = PendingWrite::Save;
        Ok(SaveRequest {
            resource_id: self.resource_id.clone(),
            key: self.draft_key.trim().to_string(),
            value: self.draft_value.clone(),
        })
    }

    /// 保存完成。成功时新建编辑器清空草稿；失败时草稿保持原样以便重试。
    pub fn finish_save(&mut self, succeeded: bool) {
        if self.pending == PendingWrite::Save {
            self.pending = PendingWrite::None;
        }
        if succeeded && self.is_new {
            self.draft_key.clear();
            self.draft_value.clear();
            self.value_visible = false;
        }
    }

    /// 进入删除状态并生成请求。新建编辑器没有删除操作。
    pub fn begin_delete(&mut self) -> Result<DeleteRequest> {
        if self.is_new {
            return Err(SyncError::DeleteUnavailable);
        }
        self.ensure_idle()?;
        self.pending = PendingWrite::Delete;
        Ok(DeleteRequest {
            resource_id: self.resource_id.clone(),
            key: self.original_key.clone(),
        })
    }

    /// 删除完成。成功后本行不会自行隐藏，等待列表重新加载。
    pub fn finish_delete(&mut self) {
        if self.pending == PendingWrite::Delete {
            self.pending = PendingWrite::None;
        }
    }

    /// 重新加载后把仍在进行中的写状态带到新建的编辑器上
    pub(crate) fn inherit_pending(&mut self, pending: PendingWrite) {
        self.pending = pending;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.pending != PendingWrite::None {
            return Err(SyncError::WriteInFlight(self.slot().label().to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn existing() -> EntryEditor {
        EntryEditor::for_entry("app-1", &ConfigEntry::new("A", "1"))
    }

    #[test]
    fn test_existing_editor_initial_state() {
        let editor = existing();
        assert_eq!(editor.original_key(), "A");
        assert_eq!(editor.draft_key(), "A");
        assert_eq!(editor.draft_value(), "1");
        assert!(!editor.is_new());
        assert!(!editor.is_value_visible());
        assert!(!editor.is_saving());
        assert!(!editor.is_deleting());
        assert_eq!(editor.slot(), Slot::existing("A"));
        assert_eq!(editor.submit_label(), "Save");
    }

    #[test]
    fn test_new_entry_editor_initial_state() {
        let editor = EntryEditor::new_entry("app-1");
        assert_eq!(editor.original_key(), "");
        assert_eq!(editor.draft_key(), "");
        assert_eq!(editor.draft_value(), "");
        assert!(editor.is_new());
        assert_eq!(editor.slot(), Slot::New);
        assert_eq!(editor.submit_label(), "Add");
        assert!(!editor.can_delete());
    }

    #[test]
    fn test_display_value_masked_by_default() {
        let mut editor = EntryEditor::for_entry("app-1", &ConfigEntry::new("PW", "héllo"));
        assert_eq!(editor.display_value(), "•••••");
        editor.toggle_visibility();
        assert_eq!(editor.display_value(), "héllo");
    }

    #[test]
    fn test_begin_save_uses_draft() {
        let mut editor = existing();
        editor.set_value("2");
        let req = editor.begin_save().unwrap();
        assert_eq!(
            req,
            SaveRequest {
                resource_id: "app-1".into(),
                key: "A".into(),
                value: "2".into(),
            }
        );
        assert!(editor.is_saving());
        assert!(!editor.is_deleting());
    }

    #[test]
    fn test_begin_save_trims_key() {
        let mut editor = EntryEditor::new_entry("app-1");
        editor.set_key("  B ");
        editor.set_value(" x ");
        let req = editor.begin_save().unwrap();
        assert_eq!(req.key, "B");
        assert_eq!(req.value, " x ");
    }

    #[test]
    fn test_finish_save_success_resets_new_entry() {
        let mut editor = EntryEditor::new_entry("app-1");
        editor.set_key("B");
        editor.set_value("x");
        editor.toggle_visibility();
        editor.begin_save().unwrap();
        editor.finish_save(true);

        assert!(!editor.is_saving());
        assert_eq!(editor.draft_key(), "");
        assert_eq!(editor.draft_value(), "");
        assert!(!editor.is_value_visible());
    }

    #[test]
    fn test_finish_save_success_keeps_existing_draft() {
        let mut editor = existing();
        editor.set_value("2");
        editor.begin_save().unwrap();
        editor.finish_save(true);
        assert!(!editor.is_saving());
        assert_eq!(editor.draft_value(), "2");
    }

    #[test]
    fn test_delete_keyed_by_original_key() {
        let mut editor = existing();
        editor.set_key("RENAMED");
        let req = editor.begin_delete().unwrap();
        assert_eq!(req.key, "A");
        assert!(editor.is_deleting());
        assert!(!editor.is_saving());

        editor.finish_delete();
        assert!(!editor.is_deleting());
        assert_eq!(editor.draft_key(), "RENAMED");
    }

    #[test]
    fn test_delete_unavailable_on_new_entry() {
        let mut editor = EntryEditor::new_entry("app-1");
        let err = editor.begin_delete().unwrap_err();
        assert!(matches!(err, SyncError::DeleteUnavailable));
        assert!(!editor.is_deleting());
    }

    #[test]
    fn test_single_writer_guard() {
        let mut editor = existing();
        editor.begin_save().unwrap();
        assert!(!editor.can_delete());
        let err = editor.begin_delete().unwrap_err();
        assert!(matches!(err, SyncError::WriteInFlight(_)));
        assert!(editor.is_saving());
        assert!(!editor.is_deleting());

        editor.finish_save(false);
        assert!(editor.can_delete());
        editor.begin_delete().unwrap();
        assert!(!editor.can_save());
        assert!(matches!(editor.begin_save(), Err(SyncError::WriteInFlight(_))));
    }

    #[test]
    fn test_finish_for_other_write_is_ignored() {
        let mut editor = existing();
        editor.begin_delete().unwrap();
        editor.finish_save(false);
        assert!(editor.is_deleting());
    }

    #[test]
    fn test_edit_while_saving_is_allowed() {
        let mut editor = existing();
        editor.begin_save().unwrap();
        editor.set_value("typed during save");
        assert_eq!(editor.draft_value(), "typed during save");
    }

    proptest! {
        #[test]
        fn prop_toggle_twice_restores_visibility(start in any::<bool>(), value in ".*") {
            let mut editor = EntryEditor::for_entry("app-1", &ConfigEntry::new("K", value));
            if start {
                editor.toggle_visibility();
            }
            let before = editor.clone();
            editor.toggle_visibility();
            editor.toggle_visibility();
            prop_assert_eq!(editor, before);
        }

        #[test]
        fn prop_failed_save_preserves_draft(key in ".*", value in ".*", is_new in any::<bool>()) {
            let mut editor = if is_new {
                EntryEditor::new_entry("app-1")
            } else {
                existing()
            };
            editor.set_key(key.clone());
            editor.set_value(value.clone());
            editor.begin_save().unwrap();
            editor.finish_save(false);

            prop_assert!(!editor.is_saving());
            prop_assert_eq!(editor.draft_key(), key.as_str());
            prop_assert_eq!(editor.draft_value(), value.as_str());
        }

        #[test]
        fn prop_successful_new_entry_save_clears_draft(key in ".*", value in ".*") {
            let mut editor = EntryEditor::new_entry("app-1");
            editor.set_key(key);
            editor.set_value(value);
            editor.begin_save().unwrap();
            editor.finish_save(true);

            prop_assert!(!editor.is_saving());
            prop_assert_eq!(editor.draft_key(), "");
            prop_assert_eq!(editor.draft_value(), "");
        }
    }
}
