pub mod collection;
pub mod editor;
pub mod page;
pub mod validate;

pub use collection::{EntryCollection, LoadTicket};
pub use editor::{DeleteRequest, EntryEditor, PendingWrite, SaveRequest};
pub use page::{EnvPage, ResourceState};
