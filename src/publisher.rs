// Copyright 2020 Joyent, Inc.

//! Publish-mode broadcast server.
//!
//! Binds a publish socket and runs a console REPL that broadcasts short
//! text files to every connected subscriber:
//!
//! * `help`       print the command list
//! * `send FILE`  broadcast FILE after a `YES` confirmation
//! * `quit`       leave the REPL
//!
//! A broadcast is at most `MAX_BROADCAST_LEN` characters of printable
//! ASCII. Problems with a file are reported on the console and the REPL
//! carries on.

use std::fs;
use std::future::Future;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use slog::{debug, info, o, warn, Logger};
use thiserror::Error;
use tokio::io::AsyncRead;
use zeromq::{PubSocket, Socket, SocketSend, ZmqMessage};

use crate::console::{Console, PROMPT};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::logging;

pub const MAX_BROADCAST_LEN: usize = 120;

/// Reply that confirms a pending broadcast.
pub const CONFIRM: &str = "YES";

pub const HELP: &str = "\
The commands are as follows:
  help        This command
  send XXX    Send the file XXX out to all subscribed clients
  quit        Exit this code";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublisherConfig {
    pub endpoint: Endpoint,
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("There is no file named {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied to read file {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Unable to read file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("The file contains non-ASCII readable text at byte {offset}")]
    NotPrintable { offset: usize },

    #[error("The file length ({len} characters) exceeds {max} characters")]
    TooLong { len: usize, max: usize },
}

/// Validate a broadcast body: printable ASCII only, at most
/// `MAX_BROADCAST_LEN` characters. A single trailing newline is dropped.
pub fn validate_broadcast(raw: &[u8]) -> std::result::Result<String, BroadcastError> {
    let body = raw
        .strip_suffix(b"\r\n")
        .or_else(|| raw.strip_suffix(b"\n"))
        .unwrap_or(raw);

    if let Some(offset) = body.iter().position(|b| !(0x20..=0x7e).contains(b)) {
        return Err(BroadcastError::NotPrintable { offset });
    }
    if body.len() > MAX_BROADCAST_LEN {
        return Err(BroadcastError::TooLong {
            len: body.len(),
            max: MAX_BROADCAST_LEN,
        });
    }

    // Printable ASCII is valid UTF-8.
    Ok(body.iter().map(|&b| b as char).collect())
}

/// Read and validate the broadcast stored in `path`.
pub fn load_broadcast(path: &Path) -> std::result::Result<String, BroadcastError> {
    let raw = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => BroadcastError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => {
            BroadcastError::PermissionDenied(path.to_path_buf())
        }
        _ => BroadcastError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    validate_broadcast(&raw)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Send(PathBuf),
    Quit,
    /// `send` without a file name.
    MissingFile,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        match verb {
            "help" => Command::Help,
            "quit" => Command::Quit,
            "send" if rest.is_empty() => Command::MissingFile,
            "send" => Command::Send(PathBuf::from(rest)),
            _ => Command::Unknown(line.to_string()),
        }
    }
}

pub struct Publisher {
    socket: PubSocket,
    endpoint: Endpoint,
    log: Logger,
}

impl Publisher {
    /// Bind the publish socket. The returned publisher reports the endpoint
    /// actually bound, which differs from the configured one when port 0
    /// was requested.
    pub async fn bind(
        config: &PublisherConfig,
        log: Option<&Logger>,
    ) -> Result<Publisher> {
        let mut socket = PubSocket::new();
        let bound = socket
            .bind(&config.endpoint.to_string())
            .await
            .map_err(|source| Error::Bind {
                endpoint: config.endpoint.clone(),
                source,
            })?;
        let endpoint = Endpoint::from(bound);
        let log = logging::or_stdlog(log)
            .new(o!("endpoint" => endpoint.to_string()));
        info!(log, "publisher bound");

        Ok(Publisher {
            socket,
            endpoint,
            log,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn publish(&mut self, payload: Bytes) -> Result<()> {
        debug!(self.log, "publishing"; "bytes" => payload.len());
        self.socket
            .send(ZmqMessage::from(payload))
            .await
            .map_err(|source| Error::Send {
                endpoint: self.endpoint.clone(),
                source,
            })
    }

    /// Run the broadcast REPL until `quit`, end of input, `shutdown` or an
    /// error, then close the channel.
    pub async fn run<R, W, S>(
        mut self,
        console: &mut Console<R, W>,
        shutdown: S,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: Write,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(self.log, "shutting down");
                    break Ok(());
                }
                handled = self.handle_next(console) => match handled {
                    Ok(true) => (),
                    Ok(false) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
        };

        self.close().await;
        result
    }

    /// Read and carry out one command. Returns `false` once the REPL
    /// should stop.
    async fn handle_next<R, W>(&mut self, console: &mut Console<R, W>) -> Result<bool>
    where
        R: AsyncRead + Unpin,
        W: Write,
    {
        let line = match console.prompt(PROMPT).await? {
            Some(line) => line,
            None => return Ok(false),
        };

        match Command::parse(&line) {
            Command::Help => console.write_line(HELP)?,
            Command::Quit => return Ok(false),
            Command::MissingFile => {
                console.write_line("Error: send requires a file name")?
            }
            Command::Unknown(_) => console.write_line(
                "Invalid command. Type help for a list of valid commands.",
            )?,
            Command::Send(path) => self.confirm_and_send(console, &path).await?,
        }
        Ok(true)
    }

    async fn confirm_and_send<R, W>(
        &mut self,
        console: &mut Console<R, W>,
        path: &Path,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: Write,
    {
        let body = match load_broadcast(path) {
            Ok(body) => body,
            Err(e) => {
                debug!(self.log, "rejected broadcast";
                    "path" => %path.display(), "err" => %e);
                return console.write_line(&format!("Error: {}", e));
            }
        };

        console.write_line(&format!(
            "The following message will be sent ({} characters):",
            body.len()
        ))?;
        console.write_line(&body)?;

        match console.prompt("Type YES to confirm: ").await? {
            Some(answer) if answer.trim() == CONFIRM => {
                self.publish(Bytes::from(body)).await?;
                console.write_line("Message sent!")
            }
            _ => console.write_line("Message not sent."),
        }
    }

    pub async fn close(self) {
        let Publisher { socket, log, .. } = self;
        for err in socket.close().await {
            warn!(log, "error while closing publisher"; "err" => %err);
        }
        debug!(log, "publisher closed");
    }
}
