//! Group profile updates for the analytics service.
//!
//! A [`GroupsClient`] turns `set`, `set_once`, `delete_group`, `remove`,
//! `union` and `unset` calls into [`RequestDescriptor`]s and hands them to a
//! [`Dispatcher`]. Everything up to the dispatcher is synchronous and pure:
//! payloads are validated per operation, reserved control keys are hoisted out
//! of property maps, and explicit [`Modifiers`] are merged on top.
//!
//! ```text
//! payload → validate → hoist control keys → merge modifiers → build → dispatch
//! ```

mod client;
mod dispatch;
mod error;
mod modifiers;
mod payload;
mod request;
pub mod value;

pub use client::{GroupRequest, GroupsClient};
pub use dispatch::{Callback, DispatchError, Dispatcher};
pub use error::{GroupsError, GroupsResult as Result};
pub use modifiers::Modifiers;
pub use payload::{Operation, Properties, PropertyMap};
pub use request::{GROUPS_ENDPOINT, GroupIdentity, Method, RequestDescriptor};
