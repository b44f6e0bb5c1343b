// Copyright 2020 Joyent, Inc.

//! Network endpoints for the clients and the publisher.

use std::fmt;
use std::time::Duration;

use slog::{warn, Logger};
use zeromq::Socket;

use crate::error::{Error, Result};

pub const DEFAULT_SUBSCRIBER_HOST: &str = "localhost";
pub const DEFAULT_SUBSCRIBER_PORT: u16 = 6000;

pub const DEFAULT_REQUESTER_HOST: &str = "localhost";
pub const DEFAULT_REQUESTER_PORT: u16 = 6500;

/// How long a connect may wait on an unreachable peer before the wait is
/// reported.
pub const CONNECT_NOTICE: Duration = Duration::from_secs(1);

/// Host used when the publisher binds; accepts connections on every
/// interface.
pub const BIND_ALL_HOST: &str = "0.0.0.0";

/// A TCP endpoint, rendered as `tcp://<host>:<port>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new<H: Into<String>>(host: H, port: u16) -> Endpoint {
        Endpoint {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parse a subscriber endpoint argument: either a bare `PORT`, which
    /// is combined with `default_host`, or `HOST:PORT`.
    pub fn from_arg(arg: &str, default_host: &str) -> Result<Endpoint> {
        match arg.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(Error::Usage(format!(
                        "invalid endpoint {:?}: missing host",
                        arg
                    )));
                }
                Ok(Endpoint::new(host, parse_port(port)?))
            }
            None => Ok(Endpoint::new(default_host, parse_port(arg)?)),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tcp://{}:{}", self.host, self.port)
    }
}

impl From<zeromq::Endpoint> for Endpoint {
    fn from(endpoint: zeromq::Endpoint) -> Endpoint {
        match endpoint {
            zeromq::Endpoint::Tcp(host, port) => {
                Endpoint::new(host.to_string(), port)
            }
            other => Endpoint::new(other.to_string(), 0),
        }
    }
}

/// Parse a user-supplied TCP port. Zero is rejected since nothing can be
/// reached on it.
pub fn parse_port(arg: &str) -> Result<u16> {
    match arg.parse::<u16>() {
        Ok(0) | Err(_) => Err(Error::Usage(format!(
            "invalid port {:?}: expected an integer between 1 and 65535",
            arg
        ))),
        Ok(port) => Ok(port),
    }
}

/// Connect `socket` to `endpoint`. The transport keeps retrying a peer
/// that refuses the connection, so this only fails for endpoints that
/// cannot be resolved or parsed; a wait longer than `CONNECT_NOTICE` is
/// logged as a warning and callers race this against their shutdown.
pub(crate) async fn connect<S: Socket>(
    socket: &mut S,
    endpoint: &Endpoint,
    log: &Logger,
) -> Result<()> {
    let addr = endpoint.to_string();
    let connecting = socket.connect(&addr);
    tokio::pin!(connecting);

    let result = tokio::select! {
        result = &mut connecting => result,
        _ = tokio::time::sleep(CONNECT_NOTICE) => {
            warn!(log, "waiting for endpoint to accept connections");
            connecting.await
        }
    };
    result.map_err(|source| Error::Connect {
        endpoint: endpoint.clone(),
        source,
    })
}
