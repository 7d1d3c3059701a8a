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

//! # x0 Server
//!
//! Host process of the x0 RV32IM simulator. Starts the event loop and the telnet line
//! service, then runs until SIGINT, SIGTERM or SIGQUIT.
//!
//! Exit status is 0 after a signal, or [`ResultCode::code`] of the failure that stopped
//! start-up.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions)]

mod echo;
mod options;

use self::echo::EchoHandler;
use self::options::Options;
use clap::Parser;
use x0_runtime::{Dispatcher, MainLoop, ResultCode, log};
use x0_service::{LineService, ServiceConfig};

fn main() {
    let options = Options::parse();
    std::process::exit(run(&options));
}

fn run(options: &Options) -> i32 {
    log::init(options.min_priority());
    tracing::info!("x0 RV32IM Simulator - v{}", env!("CARGO_PKG_VERSION"));

    let dispatcher = Dispatcher::new();
    let main_loop = MainLoop::new(&dispatcher);

    let config = ServiceConfig::new("line", options.line)
        .with_max_connections(options.max_connections);
    // Failure is already logged by the service.
    let Ok(line_service) = LineService::start(&dispatcher, config, EchoHandler) else {
        return ResultCode::CannotBindService.code();
    };

    let code = main_loop.run();

    line_service.destroy();
    tracing::info!("Terminating");
    code
}
