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

//! Telnet line sessions
//!
//! [`LineService`] is a [`SessionFactory`] that speaks just enough telnet for a character
//! mode client: it offers to echo, asks for binary mode in both directions, suppresses
//! go-ahead, asks for window size updates and declines linemode. Decoded input is assembled
//! into lines for a [`LineHandler`].

use crate::line::{Edit, LineAssembler, LineHandler, LineWriter};
use crate::session::{SessionContext, SessionFactory};
use crate::{Service, ServiceConfig, ServiceResult};
use bytes::{Buf, BytesMut};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tokio_util::codec::{Decoder, Encoder};
use x0_runtime::{Completion, Dispatcher, HandlerId, ResultCode, Timeout};
use x0_telnetcodec::naws::WindowSize;
use x0_telnetcodec::{TelnetCodec, TelnetEvent, TelnetFrame, TelnetOption};

/// Bytes requested per read.
pub const READ_CHUNK: usize = 256;

/// Session factory producing [`TelnetSession`]s.
#[derive(Debug)]
pub struct LineService<H> {
    dispatcher: Dispatcher,
    template: H,
    read_timeout: Option<Duration>,
}

impl<H: LineHandler + Clone> LineService<H> {
    /// Creates a factory that clones `template` for every session.
    pub fn new(dispatcher: &Dispatcher, template: H) -> Self {
        Self {
            dispatcher: dispatcher.clone(),
            template,
            read_timeout: None,
        }
    }

    /// Sets the per-read timeout; `None` waits forever.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Starts a [`Service`] of line sessions configured by `config`.
    ///
    /// # Errors
    ///
    /// See [`Service::new`].
    pub fn start(dispatcher: &Dispatcher, config: ServiceConfig, template: H) -> ServiceResult<Service<Self>> {
        let factory = Self::new(dispatcher, template).with_read_timeout(config.read_timeout);
        Service::new(dispatcher, config, factory)
    }
}

impl<H: LineHandler + Clone> SessionFactory for LineService<H> {
    type Session = TelnetSession<H>;

    fn create_session(&mut self, ctx: &SessionContext) -> Option<TelnetSession<H>> {
        TelnetSession::open(
            &self.dispatcher,
            ctx.clone(),
            self.template.clone(),
            self.read_timeout,
        )
    }

    fn destroy_session(&mut self, session: TelnetSession<H>) {
        session.shutdown();
    }
}

/// One telnet connection feeding a [`LineHandler`].
pub struct TelnetSession<H: LineHandler> {
    state: Rc<RefCell<SessionState<H>>>,
}

struct SessionState<H> {
    ctx: SessionContext,
    dispatcher: Dispatcher,
    codec: TelnetCodec,
    lines: LineAssembler,
    handler: H,
    window: WindowSize,
    output: BytesMut,
    read_timeout: Option<Duration>,
    close_timer: Option<HandlerId>,
    close_requested: bool,
    closed: bool,
}

impl<H: LineHandler> TelnetSession<H> {
    fn open(
        dispatcher: &Dispatcher,
        ctx: SessionContext,
        handler: H,
        read_timeout: Option<Duration>,
    ) -> Option<Self> {
        let mut state = SessionState {
            ctx,
            dispatcher: dispatcher.clone(),
            codec: TelnetCodec::new(),
            lines: LineAssembler::new(),
            handler,
            window: WindowSize::default(),
            output: BytesMut::with_capacity(READ_CHUNK),
            read_timeout,
            close_timer: None,
            close_requested: false,
            closed: false,
        };

        state.negotiate();
        if !state.flush() {
            tracing::debug!(
                "Unable to negotiate with {}:{}",
                state.ctx.client_addr(),
                state.ctx.client_port()
            );
            return None;
        }

        state.with_writer(|handler, writer| handler.on_open(writer));
        let healthy = state.flush() && !state.close_requested;

        let state = Rc::new(RefCell::new(state));
        if healthy {
            start_read(&state, BytesMut::with_capacity(READ_CHUNK));
        } else {
            state.borrow_mut().schedule_close(&Rc::downgrade(&state));
        }
        Some(Self { state })
    }

    /// Context of the underlying connection.
    pub fn context(&self) -> SessionContext {
        self.state.borrow().ctx.clone()
    }

    /// Last window size reported by the client.
    pub fn window_size(&self) -> WindowSize {
        self.state.borrow().window
    }

    /// Whether a deferred close is pending.
    pub fn is_closing(&self) -> bool {
        self.state.borrow().close_timer.is_some()
    }

    fn shutdown(self) {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        if let Some(id) = state.close_timer.take() {
            state.dispatcher.unregister_timer(id);
        }
        state.handler.on_close();
    }
}

impl<H: LineHandler> fmt::Debug for TelnetSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TelnetSession")
            .field("ctx", &state.ctx)
            .field("window", &state.window)
            .field("closing", &state.close_timer.is_some())
            .finish_non_exhaustive()
    }
}

fn start_read<H: LineHandler>(state: &Rc<RefCell<SessionState<H>>>, mut buffer: BytesMut) {
    let session = state.borrow();
    if session.closed || session.close_timer.is_some() {
        return;
    }

    buffer.clear();
    let timeout = session.read_timeout.map(Timeout::from_duration);
    let weak = Rc::downgrade(state);
    session
        .ctx
        .stream()
        .read_async(buffer, READ_CHUNK, timeout, move |completion| {
            on_read(&weak, completion);
        });
}

fn on_read<H: LineHandler>(weak: &Weak<RefCell<SessionState<H>>>, completion: Completion) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let Completion {
        result,
        transferred,
        mut buffer,
    } = completion;

    let healthy = {
        let mut session = state.borrow_mut();
        let healthy = match result {
            ResultCode::Ok if transferred > 0 => session.receive(&mut buffer),
            ResultCode::Ok | ResultCode::Hup => {
                tracing::debug!(
                    "{}:{} disconnected",
                    session.ctx.client_addr(),
                    session.ctx.client_port()
                );
                false
            }
            other => {
                tracing::debug!(
                    "Read from {}:{} failed: {}",
                    session.ctx.client_addr(),
                    session.ctx.client_port(),
                    other
                );
                false
            }
        };
        if !healthy {
            session.schedule_close(weak);
        }
        healthy
    };

    if healthy {
        start_read(&state, buffer);
    }
}

impl<H: LineHandler> SessionState<H> {
    fn negotiate(&mut self) {
        let frames = [
            self.codec.enable_local(TelnetOption::Echo),
            self.codec.enable_local(TelnetOption::TransmitBinary),
            self.codec.enable_remote(TelnetOption::TransmitBinary),
            self.codec.enable_local(TelnetOption::SuppressGoAhead),
            self.codec.enable_remote(TelnetOption::SuppressGoAhead),
            self.codec.enable_remote(TelnetOption::NAWS),
            Some(TelnetFrame::Wont(TelnetOption::Linemode)),
        ];
        for frame in frames.into_iter().flatten() {
            self.send_frame(frame);
        }
    }

    /// Handles received bytes; false once the session should end.
    fn receive(&mut self, buffer: &mut BytesMut) -> bool {
        while buffer.has_remaining() {
            match self.codec.decode(buffer) {
                Ok(Some(event)) => self.handle_event(event),
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(
                        "Telnet error from {}:{}: {}",
                        self.ctx.client_addr(),
                        self.ctx.client_port(),
                        err
                    );
                    return false;
                }
            }
        }

        for frame in self.codec.take_replies() {
            self.send_frame(frame);
        }
        self.flush() && !self.close_requested
    }

    fn handle_event(&mut self, event: TelnetEvent) {
        match event {
            TelnetEvent::Data(byte) => {
                let edit = self.lines.push(byte);
                self.apply(edit);
            }
            TelnetEvent::EraseCharacter => {
                let edit = self.lines.erase_char();
                self.apply(edit);
            }
            TelnetEvent::EraseLine | TelnetEvent::InterruptProcess => self.lines.clear(),
            TelnetEvent::AreYouThere => self.send_data(b"\r\n[Yes]\r\n"),
            TelnetEvent::WindowSize(cols, rows) => {
                tracing::debug!(
                    "{}:{} window is {}x{}",
                    self.ctx.client_addr(),
                    self.ctx.client_port(),
                    cols,
                    rows
                );
                self.window = WindowSize::new(cols, rows);
            }
            TelnetEvent::OptionStatus(option, side, enabled) => {
                tracing::debug!(
                    "{}:{} {} {} {}",
                    self.ctx.client_addr(),
                    self.ctx.client_port(),
                    side,
                    option,
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            _ => {}
        }
    }

    fn apply(&mut self, edit: Edit) {
        let echo = self.codec.is_enabled_local(TelnetOption::Echo);
        match edit {
            Edit::Inserted(byte) if echo => self.send_data(&[byte]),
            Edit::Erased if echo => self.send_data(b"\x08 \x08"),
            Edit::Line(line) => {
                if echo {
                    self.send_data(b"\r\n");
                }
                self.with_writer(|handler, writer| handler.on_line(writer, &line));
            }
            _ => {}
        }
    }

    fn with_writer(&mut self, hook: impl FnOnce(&mut H, &mut LineWriter<'_>)) {
        let Self {
            codec,
            output,
            window,
            close_requested,
            handler,
            ..
        } = self;
        let mut writer = LineWriter {
            codec,
            output,
            window: *window,
            close_requested,
        };
        hook(handler, &mut writer);
    }

    fn send_frame(&mut self, frame: TelnetFrame) {
        if let Err(err) = self.codec.encode(frame, &mut self.output) {
            tracing::warn!("Unable to encode telnet frame: {}", err);
        }
    }

    fn send_data(&mut self, data: &[u8]) {
        if let Err(err) = self.codec.encode(data, &mut self.output) {
            tracing::warn!("Unable to encode session output: {}", err);
        }
    }

    /// Writes all queued output; false if the peer cannot take it.
    fn flush(&mut self) -> bool {
        while !self.output.is_empty() {
            match self.ctx.stream().write_sync(&self.output) {
                Ok(0) => {
                    tracing::debug!(
                        "Output to {}:{} would block",
                        self.ctx.client_addr(),
                        self.ctx.client_port()
                    );
                    self.output.clear();
                    return false;
                }
                Ok(written) => self.output.advance(written),
                Err(err) => {
                    tracing::debug!(
                        "Write to {}:{} failed: {}",
                        self.ctx.client_addr(),
                        self.ctx.client_port(),
                        err
                    );
                    self.output.clear();
                    return false;
                }
            }
        }
        true
    }

    /// Closes the session from the next dispatch step.
    fn schedule_close(&mut self, weak: &Weak<RefCell<Self>>) {
        if self.closed || self.close_timer.is_some() {
            return;
        }
        let weak = weak.clone();
        let id = self.dispatcher.register_timer(0, move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let ctx = {
                let mut session = state.borrow_mut();
                session.close_timer = None;
                session.ctx.clone()
            };
            drop(state);
            ctx.close();
        });
        self.close_timer = Some(id);
    }
}
