// Copyright 2020 Joyent, Inc.

//! Request-mode REPL client.
//!
//! The session is a small state machine:
//!
//! * `AwaitingInput` reads a console line. The sentinel `quit` is sent and
//!   ends the session without waiting for a reply. Any other line is sent
//!   and moves the session to `AwaitingReply`. End of input ends the
//!   session without sending anything.
//!
//! * `AwaitingReply` blocks for exactly one reply, writes it to the
//!   console as-is and returns to `AwaitingInput`.
//!
//! * `Terminated` accepts nothing.
//!
//! This keeps the strict send/receive alternation the transport requires.

use std::future::Future;
use std::io::Write;

use bytes::Bytes;
use slog::{debug, info, o, trace, warn, Logger};
use tokio::io::AsyncRead;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::console::{Console, PROMPT};
use crate::endpoint::{self, Endpoint};
use crate::error::{Error, Result};
use crate::logging;

/// Input line that ends the session.
pub const QUIT: &str = "quit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequesterConfig {
    pub endpoint: Endpoint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    AwaitingInput,
    AwaitingReply,
    Terminated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event<'a> {
    Line(&'a str),
    EndOfInput,
    Reply,
}

impl<'a> Event<'a> {
    fn name(&self) -> &'static str {
        match self {
            Event::Line(_) => "console line",
            Event::EndOfInput => "end of input",
            Event::Reply => "reply",
        }
    }
}

impl State {
    pub fn transition(self, event: Event) -> Result<State> {
        match (self, event) {
            (State::AwaitingInput, Event::Line(line)) if line == QUIT => {
                Ok(State::Terminated)
            }
            (State::AwaitingInput, Event::Line(_)) => Ok(State::AwaitingReply),
            (State::AwaitingInput, Event::EndOfInput) => Ok(State::Terminated),
            (State::AwaitingReply, Event::Reply) => Ok(State::AwaitingInput),
            (state, event) => Err(Error::OutOfTurn {
                state,
                event: event.name(),
            }),
        }
    }
}

pub struct Requester {
    socket: ReqSocket,
    endpoint: Endpoint,
    state: State,
    log: Logger,
}

impl Requester {
    pub async fn connect(
        config: &RequesterConfig,
        log: Option<&Logger>,
    ) -> Result<Requester> {
        let log = logging::or_stdlog(log)
            .new(o!("endpoint" => config.endpoint.to_string()));

        let mut socket = ReqSocket::new();
        debug!(log, "connecting requester");
        endpoint::connect(&mut socket, &config.endpoint, &log).await?;
        info!(log, "connected");

        Ok(Requester {
            socket,
            endpoint: config.endpoint.clone(),
            state: State::AwaitingInput,
            log,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Advance the session by one transition, reading from or writing to
    /// `console` as the current state requires.
    pub async fn step<R, W>(&mut self, console: &mut Console<R, W>) -> Result<State>
    where
        R: AsyncRead + Unpin,
        W: Write,
    {
        match self.state {
            State::AwaitingInput => match console.prompt(PROMPT).await? {
                Some(line) => {
                    let next = self.state.transition(Event::Line(&line))?;
                    self.send(line).await?;
                    self.state = next;
                }
                None => {
                    debug!(self.log, "console input ended");
                    self.state = self.state.transition(Event::EndOfInput)?;
                }
            },
            State::AwaitingReply => {
                let reply = self.recv().await?;
                self.state = self.state.transition(Event::Reply)?;
                console.write(&reply)?;
            }
            State::Terminated => (),
        }
        Ok(self.state)
    }

    /// Run the session until it terminates, `shutdown` resolves or an error
    /// occurs. The channel is closed before returning in every case.
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
                    info!(self.log, "shutting down"; "state" => ?self.state);
                    break Ok(());
                }
                stepped = self.step(console) => match stepped {
                    Ok(State::Terminated) => break Ok(()),
                    Ok(_) => (),
                    Err(e) => break Err(e),
                }
            }
        };

        self.close().await;
        result
    }

    async fn send(&mut self, line: String) -> Result<()> {
        trace!(self.log, "sending request"; "bytes" => line.len());
        self.socket
            .send(ZmqMessage::from(line))
            .await
            .map_err(|source| Error::Send {
                endpoint: self.endpoint.clone(),
                source,
            })
    }

    async fn recv(&mut self) -> Result<Bytes> {
        let reply = self.socket.recv().await.map_err(|source| {
            Error::Receive {
                endpoint: self.endpoint.clone(),
                source,
            }
        })?;
        let frames = reply.into_vec();
        trace!(self.log, "received reply"; "frames" => frames.len());
        Ok(frames.concat().into())
    }

    pub async fn close(self) {
        let Requester { socket, log, .. } = self;
        for err in socket.close().await {
            warn!(log, "error while closing requester"; "err" => %err);
        }
        debug!(log, "requester closed");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quit_terminates() {
        let next = State::AwaitingInput.transition(Event::Line(QUIT)).unwrap();
        assert_eq!(next, State::Terminated);
    }

    #[test]
    fn line_awaits_reply() {
        for line in &["ping", "", "quit ", "QUIT", "quitting"] {
            let next =
                State::AwaitingInput.transition(Event::Line(*line)).unwrap();
            assert_eq!(next, State::AwaitingReply, "line {:?}", line);
        }
    }

    #[test]
    fn reply_returns_to_input() {
        let next = State::AwaitingReply.transition(Event::Reply).unwrap();
        assert_eq!(next, State::AwaitingInput);
    }

    #[test]
    fn end_of_input_terminates() {
        let next = State::AwaitingInput.transition(Event::EndOfInput).unwrap();
        assert_eq!(next, State::Terminated);
    }

    #[test]
    fn alternation_violations_are_rejected() {
        let bad = [
            (State::AwaitingInput, Event::Reply),
            (State::AwaitingReply, Event::Line("ping")),
            (State::AwaitingReply, Event::Line(QUIT)),
            (State::Terminated, Event::Line("ping")),
            (State::Terminated, Event::Reply),
            (State::Terminated, Event::EndOfInput),
        ];
        for (state, event) in bad.iter() {
            match state.transition(*event) {
                Err(Error::OutOfTurn { state: s, .. }) => assert_eq!(s, *state),
                other => panic!("{:?} on {:?}: got {:?}", event, state, other),
            }
        }
    }
}
