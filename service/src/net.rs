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

//! Bind address parsing

use crate::AddressError;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};

/// Address used when only a port is given.
pub const DEFAULT_BIND_ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Parses a `[ADDRESS:]PORT` bind address.
///
/// The address part may be a dotted-decimal IPv4 address or a host name. Host names are
/// resolved and the first IPv4 result is used. A missing address binds to
/// [`DEFAULT_BIND_ADDRESS`].
///
/// ```
/// use std::net::{Ipv4Addr, SocketAddrV4};
/// use x0_service::parse_bind_address;
///
/// assert_eq!(
///     parse_bind_address("2323").unwrap(),
///     SocketAddrV4::new(Ipv4Addr::LOCALHOST, 2323)
/// );
/// assert_eq!(
///     parse_bind_address("0.0.0.0:23").unwrap(),
///     SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 23)
/// );
/// assert!(parse_bind_address("127.0.0.1:0").is_err());
/// ```
///
/// # Errors
///
/// Fails when the port is not a number in `1..=65535` or the host cannot be resolved to an
/// IPv4 address.
pub fn parse_bind_address(arg: &str) -> Result<SocketAddrV4, AddressError> {
    let (host, port) = match arg.rsplit_once(':') {
        Some((host, port)) => (Some(host), port),
        None => (None, arg),
    };

    let port = parse_port(port)?;
    let address = match host {
        None | Some("") => DEFAULT_BIND_ADDRESS,
        Some(host) => resolve_ipv4(host, port)?,
    };

    Ok(SocketAddrV4::new(address, port))
}

fn parse_port(port: &str) -> Result<u16, AddressError> {
    let value: u64 = port
        .trim()
        .parse()
        .map_err(|_| AddressError::InvalidPort(port.to_string()))?;

    match u16::try_from(value) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(AddressError::PortOutOfRange(value)),
    }
}

fn resolve_ipv4(host: &str, port: u16) -> Result<Ipv4Addr, AddressError> {
    if let Ok(address) = host.parse::<Ipv4Addr>() {
        return Ok(address);
    }

    let mut candidates = (host, port)
        .to_socket_addrs()
        .map_err(|source| AddressError::Resolve {
            host: host.to_string(),
            source,
        })?;

    candidates
        .find_map(|candidate| match candidate {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(|| AddressError::NoIpv4Address(host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_only() {
        let addr = parse_bind_address("4000").unwrap();
        assert_eq!(addr, SocketAddrV4::new(Ipv4Addr::LOCALHOST, 4000));
    }

    #[test]
    fn test_empty_address_uses_default() {
        let addr = parse_bind_address(":4000").unwrap();
        assert_eq!(*addr.ip(), DEFAULT_BIND_ADDRESS);
    }

    #[test]
    fn test_explicit_address() {
        let addr = parse_bind_address("10.1.2.3:65535").unwrap();
        assert_eq!(addr, SocketAddrV4::new(Ipv4Addr::new(10, 1, 2, 3), 65535));
    }

    #[test]
    fn test_localhost_resolves() {
        let addr = parse_bind_address("localhost:2323").unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 2323);
    }

    #[test]
    fn test_invalid_ports() {
        assert!(matches!(
            parse_bind_address("telnet"),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            parse_bind_address("127.0.0.1:"),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            parse_bind_address("0"),
            Err(AddressError::PortOutOfRange(0))
        ));
        assert!(matches!(
            parse_bind_address("65536"),
            Err(AddressError::PortOutOfRange(65536))
        ));
    }
}
