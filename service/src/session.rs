//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Session context and factory trait

use std::fmt;
use std::rc::Weak;
use x0_runtime::Stream;

/// Identifies one session of a service.
///
/// Keys are never reused: the slot index may be recycled, but the serial is unique per
/// service, so closing through a stale key is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub(crate) index: usize,
    pub(crate) serial: u64,
}

impl SessionKey {
    /// Per-service serial number of the session.
    pub fn serial(self) -> u64 {
        self.serial
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.serial)
    }
}

/// The service side of a [`SessionContext`].
///
/// Implemented by the service so contexts do not need to know its factory type.
pub trait SessionOwner {
    /// Service name used in log messages.
    fn name(&self) -> &str;

    /// Closes the session identified by `key`, if it is still open.
    fn close_session(&self, key: SessionKey);

    /// Whether `key` still refers to a live session.
    fn contains(&self, key: SessionKey) -> bool;
}

/// What a session knows about its connection.
///
/// The context is handed to [`SessionFactory::create_session`] and may be cloned into
/// the session. It holds only a weak reference to its service.
#[derive(Clone)]
pub struct SessionContext {
    pub(crate) owner: Weak<dyn SessionOwner>,
    pub(crate) stream: Stream,
    pub(crate) client_addr: String,
    pub(crate) client_port: u16,
    pub(crate) key: SessionKey,
}

impl SessionContext {
    /// Stream over the accepted socket, used for both directions.
    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    /// Peer IPv4 address in dotted-decimal form, or `?` when unknown.
    pub fn client_addr(&self) -> &str {
        &self.client_addr
    }

    /// Peer TCP port, or 0 when unknown.
    pub fn client_port(&self) -> u16 {
        self.client_port
    }

    /// Key of this session within its service.
    pub fn session_key(&self) -> SessionKey {
        self.key
    }

    /// Name of the owning service, if it still exists.
    pub fn service_name(&self) -> Option<String> {
        self.owner.upgrade().map(|owner| owner.name().to_string())
    }

    /// Whether the session is still held by its service.
    pub fn is_open(&self) -> bool {
        self.owner
            .upgrade()
            .is_some_and(|owner| owner.contains(self.key))
    }

    /// Asks the owning service to close this session.
    ///
    /// The session's destroy hook runs before this returns, so it must not be called from a
    /// stream completion of the same session. Post a zero-delay timer instead. When called
    /// from inside a factory hook, the destroy hook runs once that hook returns.
    pub fn close(&self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.close_session(self.key);
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("key", &self.key)
            .field("client_addr", &self.client_addr)
            .field("client_port", &self.client_port)
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

/// Builds and tears down the sessions of a [`Service`](crate::Service).
///
/// # Example
///
/// ```no_run
/// use x0_service::{SessionContext, SessionFactory};
///
/// struct Greeter;
///
/// impl SessionFactory for Greeter {
///     type Session = SessionContext;
///
///     fn create_session(&mut self, ctx: &SessionContext) -> Option<SessionContext> {
///         ctx.stream().write_sync(b"hello\r\n").ok()?;
///         Some(ctx.clone())
///     }
///
///     fn destroy_session(&mut self, _session: SessionContext) {}
/// }
/// ```
pub trait SessionFactory: 'static {
    /// Per-connection state kept by the service.
    type Session: 'static;

    /// Called for each accepted connection.
    ///
    /// May start stream operations on `ctx.stream()`. Returning `None` refuses the
    /// connection and the socket is closed. Must not destroy the service.
    fn create_session(&mut self, ctx: &SessionContext) -> Option<Self::Session>;

    /// Called once when a session leaves the service.
    ///
    /// The stream is destroyed and the socket closed after this returns.
    fn destroy_session(&mut self, session: Self::Session);
}
