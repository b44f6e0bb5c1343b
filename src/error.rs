// Copyright 2020 Joyent, Inc.

use std::io;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;
use zeromq::ZmqError;

use crate::endpoint::Endpoint;
use crate::requester::State;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Wrong argument count or a malformed argument.
    #[error("{0}")]
    Usage(String),

    /// Help or version output requested on the command line.
    #[error(transparent)]
    Clap(#[from] clap::Error),

    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: ZmqError,
    },

    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: Endpoint,
        #[source]
        source: ZmqError,
    },

    #[error("failed to subscribe to {endpoint} with filter {filter:?}: {source}")]
    Subscribe {
        endpoint: Endpoint,
        filter: String,
        #[source]
        source: ZmqError,
    },

    #[error("failed to send to {endpoint}: {source}")]
    Send {
        endpoint: Endpoint,
        #[source]
        source: ZmqError,
    },

    #[error("failed to receive from {endpoint}: {source}")]
    Receive {
        endpoint: Endpoint,
        #[source]
        source: ZmqError,
    },

    #[error("console I/O failed: {0}")]
    Console(#[from] io::Error),

    #[error("console line exceeds {max} bytes")]
    LineTooLong { max: usize },

    /// A request/reply event arrived that the current state does not
    /// accept.
    #[error("{event} is not allowed while {state:?}")]
    OutOfTurn { state: State, event: &'static str },
}

impl Error {
    /// Whether this error is a command-line problem, reported with a
    /// usage line rather than as a runtime failure.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }
}

pub(crate) fn lines_error(err: LinesCodecError, max: usize) -> Error {
    match err {
        LinesCodecError::Io(e) => Error::Console(e),
        LinesCodecError::MaxLineLengthExceeded => Error::LineTooLong { max },
    }
}
