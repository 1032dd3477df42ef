use std::{fmt, sync::Arc};

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::{
    dispatch::{Callback, DispatchError, Dispatcher},
    error::GroupsResult,
    modifiers::{self, Modifiers},
    payload::{self, Payload, Properties},
    request::{self, GroupIdentity, RequestDescriptor},
};

/// Entry point for group profile updates.
///
/// Holds the project token and the dispatcher requests are handed to. Cheap
/// to clone; clones share the dispatcher.
#[derive(Clone)]
pub struct GroupsClient {
    token: SecretString,
    dispatcher: Arc<dyn Dispatcher>,
}

impl fmt::Debug for GroupsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupsClient").field("token", &self.token).finish_non_exhaustive()
    }
}

impl GroupsClient {
    pub fn new(token: SecretString, dispatcher: impl Dispatcher + 'static) -> Self {
        Self::with_shared_dispatcher(token, Arc::new(dispatcher))
    }

    pub fn with_shared_dispatcher(token: SecretString, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { token, dispatcher }
    }

    /// Set properties on a group, overwriting existing values.
    pub fn set(&self, group: GroupIdentity, properties: impl Into<Properties>) -> GroupRequest<'_> {
        self.request(
            group,
            Payload::Set {
                properties: properties.into(),
                once: false,
            },
        )
    }

    /// Set properties on a group only where they are not set yet.
    pub fn set_once(&self, group: GroupIdentity, properties: impl Into<Properties>) -> GroupRequest<'_> {
        self.request(
            group,
            Payload::Set {
                properties: properties.into(),
                once: true,
            },
        )
    }

    /// Delete the group profile.
    pub fn delete_group(&self, group: GroupIdentity) -> GroupRequest<'_> {
        self.request(group, Payload::Delete)
    }

    /// Remove values from list properties. Expects an object of scalar values.
    pub fn remove(&self, group: GroupIdentity, data: impl Into<Value>) -> GroupRequest<'_> {
        self.request(group, Payload::Remove(data.into()))
    }

    /// Merge values into list properties. Expects an object whose values are
    /// scalars or arrays of scalars; scalars are sent as one element lists.
    pub fn union(&self, group: GroupIdentity, data: impl Into<Value>) -> GroupRequest<'_> {
        self.request(group, Payload::Union(data.into()))
    }

    /// Unset one property name, or an array of them.
    pub fn unset(&self, group: GroupIdentity, properties: impl Into<Value>) -> GroupRequest<'_> {
        self.request(group, Payload::Unset(properties.into()))
    }

    fn request(&self, group: GroupIdentity, payload: Payload) -> GroupRequest<'_> {
        GroupRequest {
            client: self,
            group,
            payload,
            modifiers: Modifiers::default(),
            callback: None,
        }
    }
}

/// A pending group operation.
///
/// Nothing happens until [`GroupRequest::send`] or [`GroupRequest::build`] is
/// called.
#[must_use = "a group request does nothing until it is sent"]
pub struct GroupRequest<'a> {
    client: &'a GroupsClient,
    group: GroupIdentity,
    payload: Payload,
    modifiers: Modifiers,
    callback: Option<Callback>,
}

impl GroupRequest<'_> {
    /// Modifiers applied on top of any control keys found in the properties.
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Called by the dispatcher when the request completes. Never called if
    /// the payload is rejected.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Result<(), DispatchError>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Validate the payload and assemble the request without sending it.
    pub fn build(self) -> GroupsResult<RequestDescriptor> {
        assemble(self.client, &self.group, self.payload, &self.modifiers)
    }

    /// Validate, assemble and dispatch the request.
    ///
    /// A rejected payload is logged and returned; the dispatcher and the
    /// callback are not invoked. Ignoring the error gives the usual silent
    /// drop.
    pub fn send(self) -> GroupsResult<RequestDescriptor> {
        let Self {
            client,
            group,
            payload,
            modifiers,
            callback,
        } = self;

        let request = match assemble(client, &group, payload, &modifiers) {
            Ok(request) => request,
            Err(error) => {
                log::warn!("{error}");
                return Err(error);
            }
        };

        log::debug!(
            "Sending group update for {}/{}: {}",
            group.group_key,
            group.group_id,
            request.operation_key().unwrap_or_default()
        );

        client.dispatcher.send_request(request.clone(), callback);

        Ok(request)
    }
}

fn assemble(
    client: &GroupsClient,
    group: &GroupIdentity,
    payload: Payload,
    explicit: &Modifiers,
) -> GroupsResult<RequestDescriptor> {
    let (mutation, staged) = payload::validate(payload)?;
    let modifiers = modifiers::merge(staged, explicit);

    Ok(request::build(client.token.expose_secret(), group, mutation, modifiers))
}
