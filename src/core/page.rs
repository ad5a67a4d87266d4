use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::collection::{EntryCollection, LoadTicket};
use super::editor::{EntryEditor, SaveRequest};
use super::validate;
use crate::error::{Result, SyncError};
use crate::models::{ConfigEntry, Resource, Slot};
use crate::notify::Notifier;
use crate::store::RemoteStore;
use crate::view::PageView;

/// 父资源的查询状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// 没有选中资源
    Unselected,
    Loading,
    Found(Resource),
    NotFound,
    Failed(String),
}

/// 后台请求完成后回到页面的消息。发出时的打开批次随消息一起返回，见 [`EnvPage::open`]。
enum Completion {
    Resource {
        resource_id: String,
        result: Result<Option<Resource>>,
    },
    Entries {
        ticket: LoadTicket,
        result: Result<Vec<ConfigEntry>>,
    },
    Saved {
        resource_id: String,
        slot: Slot,
        key: String,
        result: Result<()>,
    },
    Deleted {
        resource_id: String,
        slot: Slot,
        key: String,
        result: Result<()>,
    },
}

/// 环境变量页面：驱动资源查询、配置项列表和每行编辑器。
///
/// 所有远端调用都在后台任务中执行，结果通过 [`EnvPage::next_completion`] 逐个应用，
/// 页面状态只在拥有者任务上修改。必须在 tokio 运行时内使用。
pub struct EnvPage {
    store: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    resource_id: String,
    resource: ResourceState,
    collection: Option<EntryCollection>,
    epoch: u64,
    tasks: JoinSet<(u64, Completion)>,
}

impl EnvPage {
    pub fn new(store: Arc<dyn RemoteStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            resource_id: String::new(),
            resource: ResourceState::Unselected,
            collection: None,
            epoch: 0,
            tasks: JoinSet::new(),
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn resource_state(&self) -> &ResourceState {
        &self.resource
    }

    /// 只有资源存在时才有列表
    pub fn collection(&self) -> Option<&EntryCollection> {
        self.collection.as_ref()
    }

    pub fn editor(&self, slot: &Slot) -> Option<&EntryEditor> {
        self.collection
            .as_ref()
            .filter(|c| c.is_available())
            .and_then(|c| c.editor(slot))
    }

    /// 仍在进行中的请求数
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn view(&self) -> PageView {
        PageView::of(self)
    }

    /// 打开某个资源的页面。空 id 表示没有选中资源，不发起任何请求。
    /// 资源存在才会继续加载配置项。
    ///
    /// 每次打开都开始新的批次，之前发出的请求（包括同一资源的）完成后直接丢弃。
    pub fn open(&mut self, resource_id: &str) {
        self.epoch += 1;
        self.resource_id = resource_id.trim().to_string();
        self.collection = None;
        if self.resource_id.is_empty() {
            self.resource = ResourceState::Unselected;
            return;
        }
        self.resource = ResourceState::Loading;

        tracing::debug!(resource_id = %self.resource_id, epoch = self.epoch, "looking up resource");
        let store = self.store.clone();
        let id = self.resource_id.clone();
        let resource_id = id.clone();
        self.dispatch(
            async move { store.get_resource(&id).await },
            move |result| Completion::Resource {
                resource_id,
                result,
            },
        );
    }

    /// 重新拉取配置项列表，绕过缓存。列表不存在时返回 false。
    pub fn reload(&mut self) -> bool {
        let Some(collection) = self.collection.as_mut() else {
            return false;
        };
        let Some(ticket) = collection.begin_load() else {
            return false;
        };

        tracing::debug!(
            resource_id = %ticket.resource_id,
            generation = ticket.generation(),
            "loading entries"
        );
        let store = self.store.clone();
        let id = ticket.resource_id.clone();
        self.dispatch(
            async move { store.list_entries(&id).await },
            move |result| Completion::Entries { ticket, result },
        );
        true
    }

    pub fn edit_key(&mut self, slot: &Slot, key: impl Into<String>) -> Result<()> {
        self.editor_mut(slot)?.set_key(key);
        Ok(())
    }

    pub fn edit_value(&mut self, slot: &Slot, value: impl Into<String>) -> Result<()> {
        self.editor_mut(slot)?.set_value(value);
        Ok(())
    }

    pub fn toggle_visibility(&mut self, slot: &Slot) -> Result<()> {
        self.editor_mut(slot)?.toggle_visibility();
        Ok(())
    }

    /// 提交一行。校验失败或本行已有写操作时通过 notifier 提示并返回 false。
    pub fn submit(&mut self, slot: &Slot) -> bool {
        let request = match self.prepare_save(slot) {
            Ok(request) => request,
            Err(e) => {
                self.report(&e);
                return false;
            }
        };

        tracing::debug!(resource_id = %request.resource_id, key = %request.key, "saving entry");
        let store = self.store.clone();
        let slot = slot.clone();
        let resource_id = request.resource_id.clone();
        let key = request.key.clone();
        self.dispatch(
            async move {
                store
                    .set_entry(&request.resource_id, &request.key, &request.value)
                    .await
            },
            move |result| Completion::Saved {
                resource_id,
                slot,
                key,
                result,
            },
        );
        true
    }

    /// 删除一行。新建编辑器没有删除操作。
    pub fn delete(&mut self, slot: &Slot) -> bool {
        let request = match self.available_mut(slot).and_then(|c| c.begin_delete(slot)) {
            Ok(request) => request,
            Err(e) => {
                self.report(&e);
                return false;
            }
        };

        tracing::debug!(resource_id = %request.resource_id, key = %request.key, "deleting entry");
        let store = self.store.clone();
        let slot = slot.clone();
        let resource_id = request.resource_id.clone();
        let key = request.key.clone();
        self.dispatch(
            async move { store.unset_entry(&request.resource_id, &request.key).await },
            move |result| Completion::Deleted {
                resource_id,
                slot,
                key,
                result,
            },
        );
        true
    }

    /// 等待并应用一个完成的请求。没有进行中的请求时返回 false。
    pub async fn next_completion(&mut self) -> bool {
        match self.tasks.join_next().await {
            Some(Ok((epoch, completion))) => {
                if epoch == self.epoch {
                    self.apply(completion);
                } else {
                    tracing::debug!(
                        epoch,
                        current = self.epoch,
                        "discarding completion from earlier open"
                    );
                }
                true
            }
            Some(Err(e)) => {
                tracing::warn!("completion task failed: {}", e);
                true
            }
            None => false,
        }
    }

    /// 应用完成消息直到没有进行中的请求，包括写成功后触发的重新加载
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn available_mut(&mut self, slot: &Slot) -> Result<&mut EntryCollection> {
        self.collection
            .as_mut()
            .filter(|c| c.is_available())
            .ok_or_else(|| SyncError::UnknownRow(slot.label().to_string()))
    }

    fn editor_mut(&mut self, slot: &Slot) -> Result<&mut EntryEditor> {
        self.available_mut(slot)?
            .editor_mut(slot)
            .ok_or_else(|| SyncError::UnknownRow(slot.label().to_string()))
    }

    fn prepare_save(&mut self, slot: &Slot) -> Result<SaveRequest> {
        let collection = self.available_mut(slot)?;
        let editor = collection
            .editor(slot)
            .ok_or_else(|| SyncError::UnknownRow(slot.label().to_string()))?;
        if !editor.can_save() {
            return Err(SyncError::WriteInFlight(slot.label().to_string()));
        }
        validate::check_submission(editor, collection.entries())?;

        collection.begin_save(slot)
    }

    /// 远端调用放到独立任务里执行，即使它 panic 也能把失败送回对应的行
    fn dispatch<T, F, C>(&mut self, call: F, complete: C)
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
        C: FnOnce(Result<T>) -> Completion + Send + 'static,
    {
        let epoch = self.epoch;
        self.tasks.spawn(async move {
            let result = match tokio::spawn(call).await {
                Ok(result) => result,
                Err(e) => Err(SyncError::Transport(format!("request task failed: {}", e))),
            };
            (epoch, complete(result))
        });
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Resource {
                resource_id,
                result,
            } => {
                if resource_id != self.resource_id || self.resource != ResourceState::Loading {
                    tracing::debug!(%resource_id, "discarding stale resource lookup");
                    return;
                }
                match result {
                    Ok(Some(resource)) => {
                        tracing::info!(
                            resource_id = %resource.id,
                            name = %resource.name,
                            "resource found"
                        );
                        self.resource = ResourceState::Found(resource);
                        self.collection = Some(EntryCollection::new(&self.resource_id));
                        self.reload();
                    }
                    Ok(None) => {
                        tracing::info!(%resource_id, "resource not found");
                        self.resource = ResourceState::NotFound;
                    }
                    Err(e) => {
                        self.report(&e);
                        self.resource = ResourceState::Failed(e.to_string());
                    }
                }
            }
            Completion::Entries { ticket, result } => {
                let Some(collection) = self.collection.as_mut() else {
                    return;
                };
                let failure = result.as_ref().err().map(|e| e.to_string());
                if collection.finish_load(ticket, result) {
                    if let Some(message) = failure {
                        self.notifier.error(&message);
                    }
                }
            }
            Completion::Saved {
                resource_id,
                slot,
                key,
                result,
            } => {
                let found = self
                    .collection
                    .as_mut()
                    .is_some_and(|c| c.finish_save(&slot, result.is_ok()));
                if !found {
                    tracing::debug!(%key, "save finished for a row that is gone");
                }
                match result {
                    Ok(()) => {
                        tracing::info!(%resource_id, %key, "entry saved");
                        self.reload();
                    }
                    Err(e) => self.report(&e),
                }
            }
            Completion::Deleted {
                resource_id,
                slot,
                key,
                result,
            } => {
                let found = self.collection.as_mut().is_some_and(|c| c.finish_delete(&slot));
                if !found {
                    tracing::debug!(%key, "delete finished for a row that is gone");
                }
                match result {
                    Ok(()) => {
                        tracing::info!(%resource_id, %key, "entry deleted");
                        self.reload();
                    }
                    Err(e) => self.report(&e),
                }
            }
        }
    }

    fn report(&self, e: &SyncError) {
        tracing::warn!(resource_id = %self.resource_id, "{}", e);
        self.notifier.error(&e.to_string());
    }
}
