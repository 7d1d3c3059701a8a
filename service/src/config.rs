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

//! Service configuration

use crate::{ServiceError, ServiceResult};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

/// Port the line service listens on unless told otherwise.
pub const DEFAULT_LINE_PORT: u16 = 2323;

/// Session cap used unless told otherwise.
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Service configuration
///
/// Use the builder pattern methods to customize the configuration.
///
/// # Example
///
/// ```
/// use x0_service::ServiceConfig;
/// use std::time::Duration;
///
/// let config = ServiceConfig::new("line", "127.0.0.1:4000".parse().unwrap())
///     .with_max_connections(8)
///     .with_read_timeout(Duration::from_secs(600));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Name used in log messages
    pub name: String,

    /// Address to bind the listening socket to
    pub bind_address: SocketAddrV4,

    /// Maximum number of concurrent sessions
    ///
    /// Connections accepted while the cap is reached are closed immediately.
    pub max_connections: usize,

    /// Timeout for each session read
    ///
    /// `None` lets sessions wait for input indefinitely.
    pub read_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "line".to_string(),
            bind_address: SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_LINE_PORT),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            read_timeout: None,
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration with the given name and bind address
    ///
    /// All other settings will use their default values.
    pub fn new(name: impl Into<String>, bind_address: SocketAddrV4) -> Self {
        Self {
            name: name.into(),
            bind_address,
            ..Default::default()
        }
    }

    /// Set the bind address
    #[must_use]
    pub fn with_bind_address(mut self, bind_address: SocketAddrV4) -> Self {
        self.bind_address = bind_address;
        self
    }

    /// Set the maximum number of concurrent sessions
    #[must_use]
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the read timeout duration
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] naming the first offending setting.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.name.is_empty() {
            return Err(ServiceError::Config("name must not be empty".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ServiceError::Config(
                "max_connections must be greater than 0".to_string(),
            ));
        }

        if self.read_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ServiceError::Config(
                "read_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.name, "line");
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:2323");
        assert_eq!(config.max_connections, 64);
        assert_eq!(config.read_timeout, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ServiceConfig::default()
            .with_bind_address(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 9000))
            .with_max_connections(2)
            .with_read_timeout(Duration::from_secs(5));

        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.read_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_validation() {
        let mut config = ServiceConfig::default();

        config.max_connections = 0;
        assert!(config.validate().is_err());

        config.max_connections = 1;
        config.name = String::new();
        assert!(config.validate().is_err());

        config.name = "gdb".to_string();
        config.read_timeout = Some(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
