use std::fmt;

use crate::core::{EntryEditor, EnvPage, ResourceState};
use crate::models::{LoadStatus, Resource, Slot};

/// 页面的渲染约定：只描述要显示什么，不涉及样式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    /// 没有选中资源，什么都不渲染
    Blank,
    /// 资源信息加载中
    Loading,
    NotFound,
    LookupFailed(String),
    Ready {
        resource: Resource,
        entries: EntriesView,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntriesView {
    Loading,
    Unavailable(String),
    /// 已有行按存储顺序排列，新建行永远在最后
    Rows { rows: Vec<RowView>, new_entry: RowView },
}

/// 一行编辑器的显示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub slot: Slot,
    pub key: String,
    /// 隐藏时为圆点
    pub value: String,
    pub masked: bool,
    pub is_new: bool,
    pub submit_label: &'static str,
    pub can_delete: bool,
    pub saving: bool,
    pub deleting: bool,
}

impl RowView {
    pub fn of(editor: &EntryEditor) -> Self {
        Self {
            slot: editor.slot(),
            key: editor.draft_key().to_string(),
            value: editor.display_value(),
            masked: !editor.is_value_visible(),
            is_new: editor.is_new(),
            submit_label: editor.submit_label(),
            can_delete: editor.can_delete(),
            saving: editor.is_saving(),
            deleting: editor.is_deleting(),
        }
    }
}

impl PageView {
    pub fn of(page: &EnvPage) -> Self {
        let resource = match page.resource_state() {
            ResourceState::Unselected => return PageView::Blank,
            ResourceState::Loading => return PageView::Loading,
            ResourceState::NotFound => return PageView::NotFound,
            ResourceState::Failed(message) => return PageView::LookupFailed(message.clone()),
            ResourceState::Found(resource) => resource.clone(),
        };

        let entries = match page.collection() {
            None => EntriesView::Loading,
            Some(collection) => match collection.status() {
                LoadStatus::Idle | LoadStatus::Loading => EntriesView::Loading,
                LoadStatus::Error(message) => EntriesView::Unavailable(message.clone()),
                LoadStatus::Ready => EntriesView::Rows {
                    rows: collection.editors().iter().map(RowView::of).collect(),
                    new_entry: RowView::of(collection.new_entry_editor()),
                },
            },
        };
        PageView::Ready { resource, entries }
    }
}

impl fmt::Display for RowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.saving {
            " (saving)"
        } else if self.deleting {
            " (deleting)"
        } else {
            ""
        };
        if self.is_new {
            write!(f, "+ {}={} [{}]{}", self.key, self.value, self.submit_label, state)
        } else {
            write!(f, "  {}={}{}", self.key, self.value, state)
        }
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageView::Blank => Ok(()),
            PageView::Loading => write!(f, "Loading..."),
            PageView::NotFound => write!(f, "App not found."),
            PageView::LookupFailed(message) => write!(f, "Could not load app: {}", message),
            PageView::Ready { resource, entries } => {
                writeln!(f, "{} ({})", resource.name, resource.id)?;
                match entries {
                    EntriesView::Loading => write!(f, "Loading..."),
                    EntriesView::Unavailable(message) => {
                        write!(f, "Env vars unavailable: {}", message)
                    }
                    EntriesView::Rows { rows, .. } if rows.is_empty() => {
                        write!(f, "No env vars set.")
                    }
                    EntriesView::Rows { rows, .. } => {
                        let lines: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
                        write!(f, "{}", lines.join("\n"))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfigEntry;

    #[test]
    fn test_row_view_masks_value() {
        let editor = EntryEditor::for_entry("app-1", &ConfigEntry::new("TOKEN", "abc"));
        let row = RowView::of(&editor);
        assert_eq!(row.value, "•••");
        assert!(row.masked);
        assert_eq!(row.submit_label, "Save");
        assert!(row.can_delete);
        assert_eq!(row.to_string(), "  TOKEN=•••");
    }

    #[test]
    fn test_new_entry_row() {
        let editor = EntryEditor::new_entry("app-1");
        let row = RowView::of(&editor);
        assert!(row.is_new);
        assert!(!row.can_delete);
        assert_eq!(row.submit_label, "Add");
        assert_eq!(row.slot, Slot::New);
    }

    #[test]
    fn test_page_display() {
        let resource = Resource {
            id: "app-1".into(),
            name: "demo".into(),
        };
        let shown = EntryEditor::for_entry("app-1", &ConfigEntry::new("A", "1"));
        let view = PageView::Ready {
            resource: resource.clone(),
            entries: EntriesView::Rows {
                rows: vec![RowView::of(&shown)],
                new_entry: RowView::of(&EntryEditor::new_entry("app-1")),
            },
        };
        assert_eq!(view.to_string(), "demo (app-1)\n  A=•");

        let empty = PageView::Ready {
            resource,
            entries: EntriesView::Rows {
                rows: vec![],
                new_entry: RowView::of(&EntryEditor::new_entry("app-1")),
            },
        };
        assert_eq!(empty.to_string(), "demo (app-1)\nNo env vars set.");
        assert_eq!(PageView::NotFound.to_string(), "App not found.");
    }
}
