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

//! Error types for the runtime

use std::io;
use thiserror::Error;

/// Result type for runtime operations
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// Runtime error types
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Terminating signals could not be blocked on the calling thread
    #[error("Unable to block signals: {0}")]
    SignalMask(#[source] io::Error),

    /// The signal descriptor could not be created
    #[error("Unable to create signal fd: {0}")]
    SignalDescriptor(#[source] io::Error),
}
