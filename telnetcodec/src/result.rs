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

use crate::TelnetOption;
use thiserror::Error;

/// Result Type for Codec Operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while encoding or decoding Telnet data.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An I/O error from the underlying transport, as required by `tokio_util::codec`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A subnegotiation payload could not be interpreted.
    #[error("Invalid {option} subnegotiation: {reason}")]
    Subnegotiation {
        /// The option being subnegotiated
        option: TelnetOption,
        /// What was wrong with the payload
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodecError::Subnegotiation {
            option: TelnetOption::NAWS,
            reason: "too short".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid NAWS subnegotiation: too short");
    }

    #[test]
    fn test_error_from_io() {
        let err: CodecError = std::io::Error::other("closed").into();
        assert!(matches!(err, CodecError::Io(_)));
    }
}
