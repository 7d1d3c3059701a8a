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

//! Default line handler

use x0_service::{LineHandler, LineWriter};

/// Prefix put in front of every echoed line.
pub const ECHO_PREFIX: &str = "> ";

/// Sends each line back to the client.
///
/// Stands in for the interactive console until one is attached to the line service.
#[derive(Debug, Clone, Default)]
pub struct EchoHandler;

impl LineHandler for EchoHandler {
    fn on_line(&mut self, writer: &mut LineWriter<'_>, line: &str) {
        let mut reply = String::with_capacity(ECHO_PREFIX.len() + line.len());
        reply.push_str(ECHO_PREFIX);
        reply.push_str(line);
        writer.write_line(&reply);
    }
}
