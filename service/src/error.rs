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

//! Error types for services

use std::io;
use std::net::SocketAddrV4;
use thiserror::Error;

/// Result type for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Service error types
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The configuration was rejected by [`ServiceConfig::validate`](crate::ServiceConfig::validate)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A bind address could not be parsed or resolved
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The listening socket could not be created or configured
    #[error("Unable to create socket: {0}")]
    Socket(#[source] io::Error),

    /// The listening socket could not be bound
    #[error("Unable to bind {address}: {source}")]
    Bind {
        /// Requested address
        address: SocketAddrV4,
        /// Underlying failure
        #[source]
        source: io::Error,
    },

    /// The bound socket could not be put in listening mode
    #[error("Unable to listen on {address}: {source}")]
    Listen {
        /// Bound address
        address: SocketAddrV4,
        /// Underlying failure
        #[source]
        source: io::Error,
    },
}

/// Errors parsing `[ADDRESS:]PORT` bind addresses
#[derive(Debug, Error)]
pub enum AddressError {
    /// The port is missing or not a number
    #[error("Invalid port '{0}'")]
    InvalidPort(String),

    /// The port is outside 1..=65535
    #[error("Port {0} out of range")]
    PortOutOfRange(u64),

    /// The host name could not be resolved
    #[error("Unable to resolve '{host}': {source}")]
    Resolve {
        /// Host that failed to resolve
        host: String,
        /// Resolver failure
        #[source]
        source: io::Error,
    },

    /// The host name resolved, but not to an IPv4 address
    #[error("No IPv4 address for '{0}'")]
    NoIpv4Address(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_error_display() {
        let err = ServiceError::Bind {
            address: SocketAddrV4::new(Ipv4Addr::LOCALHOST, 2323),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().starts_with("Unable to bind 127.0.0.1:2323: "));

        let err = ServiceError::from(AddressError::PortOutOfRange(70000));
        assert_eq!(err.to_string(), "Port 70000 out of range");
    }
}
