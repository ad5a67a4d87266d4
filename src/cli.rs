use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::core::{EnvPage, ResourceState};
use crate::error::{Result, SyncError};
use crate::models::Slot;
use crate::notify::Notifier;
use crate::store::RemoteStore;
use crate::view::PageView;

/// 查看和修改应用的环境变量
#[derive(Debug, Parser)]
#[command(name = "envsync", version)]
pub struct Cli {
    /// GraphQL endpoint (overrides ENVSYNC_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bearer token (overrides ENVSYNC_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Request timeout in seconds (overrides ENVSYNC_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// App id
    pub app_id: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List env vars; values are masked unless --reveal is given
    List {
        #[arg(long)]
        reveal: bool,
    },
    /// Add or update an env var
    Set { key: String, value: String },
    /// Remove an env var
    Unset { key: String },
}

/// 一条命令的执行结果：是否成功，以及执行后的页面
#[derive(Debug)]
pub struct Outcome {
    pub ok: bool,
    pub view: PageView,
}

/// 打开 `app_id` 的页面并执行一条命令，等所有请求（包括写后的重新加载）完成后返回。
///
/// 应用不存在、删除未知的 key 时返回错误；其余失败已经经过 notifier，
/// 只体现为 `ok == false`。
pub async fn run_command(
    store: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    app_id: &str,
    command: Command,
) -> Result<Outcome> {
    let mut page = EnvPage::new(store, notifier);
    page.open(app_id);
    page.settle().await;
    match page.resource_state() {
        ResourceState::Found(_) => {}
        ResourceState::NotFound => return Err(SyncError::ResourceNotFound(app_id.to_string())),
        _ => return Ok(finish(&page, false)),
    }
    let Some(collection) = page.collection().filter(|c| c.is_available()) else {
        return Ok(finish(&page, false));
    };
    let existing = collection.entries().iter().any(|e| match &command {
        Command::Set { key, .. } | Command::Unset { key } => e.key == key.trim(),
        Command::List { .. } => false,
    });

    let ok = match command {
        Command::List { reveal } => {
            if reveal {
                let slots: Vec<Slot> = collection.editors().iter().map(|e| e.slot()).collect();
                for slot in &slots {
                    page.toggle_visibility(slot)?;
                }
            }
            true
        }
        Command::Set { key, value } => {
            let key = key.trim().to_string();
            let slot = if existing {
                Slot::existing(&key)
            } else {
                page.edit_key(&Slot::New, key.clone())?;
                Slot::New
            };
            page.edit_value(&slot, value.clone())?;
            if page.submit(&slot) {
                page.settle().await;
            }
            // 以重新加载后的服务端数据为准
            page.collection()
                .map(|c| c.entries().iter().any(|e| e.key == key && e.value == value))
                .unwrap_or(false)
        }
        Command::Unset { key } => {
            let key = key.trim().to_string();
            if !existing {
                return Err(SyncError::UnknownRow(key));
            }
            if page.delete(&Slot::existing(&key)) {
                page.settle().await;
            }
            page.collection()
                .map(|c| c.is_available() && !c.entries().iter().any(|e| e.key == key))
                .unwrap_or(false)
        }
    };

    Ok(finish(&page, ok))
}

fn finish(page: &EnvPage, ok: bool) -> Outcome {
    Outcome {
        ok,
        view: page.view(),
    }
}
