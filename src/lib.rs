// Copyright 2020 Joyent, Inc.

//! pubreq: thin console clients for ZeroMQ publish/subscribe and
//! request/reply
//!
//! The crate provides two independent client shapes and the broadcast
//! server that feeds one of them:
//!
//! * Subscriber (`pqsub`): connect a SUB socket to an endpoint, register a
//!   topic filter (empty by default, which receives everything) and print
//!   each message on its own line, optionally prefixed with the local time
//!   it arrived.
//!
//! * Requester (`pqreq`): connect a REQ socket and run a REPL. Each console
//!   line is sent verbatim and exactly one reply is awaited and printed
//!   as-is before the next prompt. The line `quit` is sent and ends the
//!   session without waiting for a reply.
//!
//! * Publisher (`pqpub`): bind a PUB socket and broadcast short text files
//!   from a console REPL.
//!
//! Endpoints are always TCP and written `tcp://<host>:<port>`. The clients
//! add no framing of their own; message delivery, request/reply alternation
//! and subscription matching are the transport's.
//!
//! Every client runs one loop on one thread with no timeouts or retries. A
//! peer that never publishes or never replies stalls the client until it
//! is interrupted.

#![allow(missing_docs)]

pub mod cli;
pub mod console;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod message;
pub mod publisher;
pub mod requester;
pub mod signal;
pub mod subscriber;

pub use error::{Error, Result};
