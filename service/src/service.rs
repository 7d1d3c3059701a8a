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

//! TCP listener that turns accepted connections into sessions

use crate::list::SessionList;
use crate::session::{SessionContext, SessionFactory, SessionKey, SessionOwner};
use crate::{ServiceConfig, ServiceError, ServiceResult};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::cell::{Cell, RefCell, RefMut};
use std::fmt;
use std::io;
use std::net::SocketAddrV4;
use std::os::fd::AsRawFd;
use std::rc::{Rc, Weak};
use x0_runtime::{Dispatcher, Events, HandlerId, Stream};

/// Backlog passed to `listen(2)`.
pub const LISTEN_BACKLOG: i32 = 8;

struct SessionRecord<S> {
    ctx: SessionContext,
    session: Option<S>,
    socket: Socket,
}

/// A listening TCP service.
///
/// Each accepted connection gets a [`SessionContext`] and a session built by the
/// [`SessionFactory`]. Connections beyond [`ServiceConfig::max_connections`] are closed
/// without reaching the factory.
///
/// Dropping the service destroys it.
pub struct Service<F: SessionFactory> {
    inner: Rc<ServiceInner<F>>,
}

struct ServiceInner<F: SessionFactory> {
    config: ServiceConfig,
    local_addr: SocketAddrV4,
    dispatcher: Dispatcher,
    factory: RefCell<F>,
    listener: RefCell<Option<Socket>>,
    accept_id: Cell<Option<HandlerId>>,
    sessions: RefCell<SessionList<SessionRecord<F::Session>>>,
    // Closed while a factory hook held the factory; torn down once the hook returns.
    pending_closes: RefCell<Vec<SessionRecord<F::Session>>>,
    next_serial: Cell<u64>,
}

impl<F: SessionFactory> Service<F> {
    /// Binds the listening socket and starts accepting on `dispatcher`.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or the socket cannot be bound or put in
    /// listening mode. The failure is logged before it is returned.
    pub fn new(dispatcher: &Dispatcher, config: ServiceConfig, factory: F) -> ServiceResult<Self> {
        let listener = match config
            .validate()
            .and_then(|()| open_listener(config.bind_address))
        {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!("{} service unable to start: {}", config.name, err);
                return Err(err);
            }
        };

        let local_addr = listener
            .local_addr()
            .ok()
            .and_then(|addr| addr.as_socket_ipv4())
            .unwrap_or(config.bind_address);
        tracing::info!("{} service listening on {}", config.name, local_addr);

        let inner = Rc::new(ServiceInner {
            config,
            local_addr,
            dispatcher: dispatcher.clone(),
            factory: RefCell::new(factory),
            listener: RefCell::new(Some(listener)),
            accept_id: Cell::new(None),
            sessions: RefCell::new(SessionList::new()),
            pending_closes: RefCell::new(Vec::new()),
            next_serial: Cell::new(1),
        });
        inner.arm_accept();

        Ok(Self { inner })
    }

    /// Service name used in log messages.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Address the listener is bound to, with the actual port when 0 was requested.
    pub fn local_addr(&self) -> SocketAddrV4 {
        self.inner.local_addr
    }

    /// Session cap.
    pub fn max_connections(&self) -> usize {
        self.inner.config.max_connections
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.inner.sessions.borrow().len()
    }

    /// Whether the listener is still open.
    pub fn is_listening(&self) -> bool {
        self.inner.listener.borrow().is_some()
    }

    /// Contexts of the live sessions, oldest first.
    pub fn sessions(&self) -> Vec<SessionContext> {
        let sessions = self.inner.sessions.borrow();
        sessions
            .indices()
            .filter_map(|index| sessions.get(index))
            .map(|record| record.ctx.clone())
            .collect()
    }

    /// Mutable access to the factory.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a factory hook.
    pub fn factory_mut(&self) -> RefMut<'_, F> {
        self.inner.factory.borrow_mut()
    }

    /// Closes the session behind `ctx`.
    ///
    /// Contexts of other services and of sessions already closed are ignored.
    pub fn close_session(&self, ctx: &SessionContext) {
        let owned = ctx
            .owner
            .upgrade()
            .is_some_and(|owner| std::ptr::addr_eq(Rc::as_ptr(&owner), Rc::as_ptr(&self.inner)));
        if owned {
            self.inner.close_key(ctx.key);
        }
    }

    /// Closes every session, newest first, then the listener.
    ///
    /// Safe to call more than once.
    pub fn destroy(&self) {
        self.inner.shutdown();
    }
}

impl<F: SessionFactory> Drop for Service<F> {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl<F: SessionFactory> fmt::Debug for Service<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name())
            .field("local_addr", &self.local_addr())
            .field("sessions", &self.session_count())
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

fn open_listener(address: SocketAddrV4) -> ServiceResult<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .map_err(ServiceError::Socket)?;
    socket
        .set_reuse_address(true)
        .map_err(ServiceError::Socket)?;
    socket.set_nonblocking(true).map_err(ServiceError::Socket)?;
    socket
        .bind(&SockAddr::from(address))
        .map_err(|source| ServiceError::Bind { address, source })?;
    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|source| ServiceError::Listen { address, source })?;
    Ok(socket)
}

fn accept_retrying(listener: &Socket) -> io::Result<(Socket, SockAddr)> {
    loop {
        match listener.accept() {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            result => return result,
        }
    }
}

impl<F: SessionFactory> ServiceInner<F> {
    fn arm_accept(self: &Rc<Self>) {
        let Some(fd) = self.listener.borrow().as_ref().map(AsRawFd::as_raw_fd) else {
            return;
        };
        let weak = Rc::downgrade(self);
        let id = self.dispatcher.register_io(fd, Events::IN, move |events| {
            if let Some(inner) = weak.upgrade() {
                inner.on_accept(events);
            }
        });
        self.accept_id.set(Some(id));
    }

    fn on_accept(self: &Rc<Self>, events: Events) {
        self.accept_id.set(None);

        let accepted = {
            let listener = self.listener.borrow();
            let Some(listener) = listener.as_ref() else {
                return;
            };
            accept_retrying(listener)
        };

        match accepted {
            Ok((socket, peer)) => self.admit(socket, &peer),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                tracing::trace!("{} service woke without a connection ({:?})", self.config.name, events);
            }
            Err(err) => {
                tracing::warn!("{} service unable to accept connection: {}", self.config.name, err);
            }
        }

        self.arm_accept();
    }

    fn admit(self: &Rc<Self>, socket: Socket, peer: &SockAddr) {
        let name = &self.config.name;
        let open = self.sessions.borrow().len();
        if open >= self.config.max_connections {
            tracing::debug!(
                "{} service rejecting connection: {} of {} sessions in use",
                name,
                open,
                self.config.max_connections
            );
            return;
        }

        if let Err(err) = socket.set_nonblocking(true) {
            tracing::warn!("{} service unable to accept connection: {}", name, err);
            return;
        }

        let (client_addr, client_port) = match peer.as_socket_ipv4() {
            Some(addr) => (addr.ip().to_string(), addr.port()),
            None => ("?".to_string(), 0),
        };

        let fd = socket.as_raw_fd();
        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);
        let owner: Weak<Self> = Rc::downgrade(self);
        let owner: Weak<dyn SessionOwner> = owner;

        let ctx = {
            let mut sessions = self.sessions.borrow_mut();
            let ctx = SessionContext {
                owner,
                stream: Stream::new(&self.dispatcher, Some(fd), Some(fd)),
                client_addr,
                client_port,
                key: SessionKey {
                    index: sessions.vacant_index(),
                    serial,
                },
            };
            sessions.reserve(SessionRecord {
                ctx: ctx.clone(),
                session: None,
                socket,
            });
            ctx
        };

        tracing::info!(
            "{} service accepting connection from {}:{}",
            name,
            ctx.client_addr,
            ctx.client_port
        );

        let created = self.with_factory(|factory| factory.create_session(&ctx));
        match created {
            Some(session) => {
                let orphan = {
                    let mut sessions = self.sessions.borrow_mut();
                    match sessions.get_mut(ctx.key.index) {
                        Some(record) if record.ctx.key == ctx.key => {
                            record.session = Some(session);
                            sessions.link_tail(ctx.key.index);
                            None
                        }
                        _ => Some(session),
                    }
                };
                // Closed from inside create_session.
                if let Some(session) = orphan {
                    self.with_factory(|factory| factory.destroy_session(session));
                }
            }
            None => {
                tracing::debug!(
                    "{} service refused connection from {}:{}",
                    name,
                    ctx.client_addr,
                    ctx.client_port
                );
                if let Some(record) = self.take_record(ctx.key) {
                    record.ctx.stream.destroy();
                }
            }
        }
    }

    fn take_record(&self, key: SessionKey) -> Option<SessionRecord<F::Session>> {
        let mut sessions = self.sessions.borrow_mut();
        if sessions
            .get(key.index)
            .is_some_and(|record| record.ctx.key == key)
        {
            sessions.remove(key.index)
        } else {
            None
        }
    }

    /// Runs a factory hook, then finishes any close the hook requested.
    fn with_factory<R>(&self, hook: impl FnOnce(&mut F) -> R) -> R {
        let result = hook(&mut self.factory.borrow_mut());
        loop {
            let pending = std::mem::take(&mut *self.pending_closes.borrow_mut());
            if pending.is_empty() {
                break;
            }
            for record in pending {
                self.teardown(record);
            }
        }
        result
    }

    fn close_key(&self, key: SessionKey) {
        let Some(record) = self.take_record(key) else {
            return;
        };

        tracing::info!(
            "{} service closing connection from {}:{}",
            self.config.name,
            record.ctx.client_addr,
            record.ctx.client_port
        );

        if self.factory.try_borrow_mut().is_err() {
            self.pending_closes.borrow_mut().push(record);
        } else {
            self.teardown(record);
        }
    }

    fn teardown(&self, record: SessionRecord<F::Session>) {
        let SessionRecord {
            ctx,
            session,
            socket,
        } = record;
        if let Some(session) = session {
            self.with_factory(|factory| factory.destroy_session(session));
        }
        ctx.stream.destroy();
        drop(socket);
    }

    fn shutdown(&self) {
        let Some(listener) = self.listener.borrow_mut().take() else {
            return;
        };
        tracing::info!("Stopping {} service", self.config.name);

        loop {
            let newest = {
                let sessions = self.sessions.borrow();
                sessions
                    .tail()
                    .and_then(|index| sessions.get(index))
                    .map(|record| record.ctx.key)
            };
            match newest {
                Some(key) => self.close_key(key),
                None => break,
            }
        }

        if let Some(id) = self.accept_id.take() {
            self.dispatcher.unregister_io(id);
        }
        drop(listener);
    }
}

impl<F: SessionFactory> SessionOwner for ServiceInner<F> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn close_session(&self, key: SessionKey) {
        self.close_key(key);
    }

    fn contains(&self, key: SessionKey) -> bool {
        self.sessions
            .borrow()
            .get(key.index)
            .is_some_and(|record| record.ctx.key == key)
    }
}
