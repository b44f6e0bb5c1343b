// Copyright 2020 Joyent, Inc.

//! Subscribe-mode client: receive published messages and print them one
//! line at a time.

use std::future::Future;
use std::io::Write;

use futures::stream::{self, Stream};
use slog::{debug, info, o, trace, warn, Logger};
use zeromq::{Socket, SocketRecv, SubSocket};

use crate::endpoint::{self, Endpoint};
use crate::error::{Error, Result};
use crate::logging;
use crate::message::{LineFormat, Message, TopicFilter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriberConfig {
    pub endpoint: Endpoint,
    pub filter: TopicFilter,
    pub format: LineFormat,
}

pub struct Subscriber {
    socket: SubSocket,
    endpoint: Endpoint,
    filter: TopicFilter,
    log: Logger,
}

impl Subscriber {
    /// Connect to the configured endpoint and register the topic filter.
    /// The filter is in place before this returns, so it applies to every
    /// message later handed out by `recv`.
    pub async fn connect(
        config: &SubscriberConfig,
        log: Option<&Logger>,
    ) -> Result<Subscriber> {
        let log = logging::or_stdlog(log).new(o!(
            "endpoint" => config.endpoint.to_string(),
            "filter" => config.filter.as_str().to_string()
        ));

        let mut socket = SubSocket::new();
        debug!(log, "connecting subscriber");
        endpoint::connect(&mut socket, &config.endpoint, &log).await?;
        socket
            .subscribe(config.filter.as_str())
            .await
            .map_err(|source| Error::Subscribe {
                endpoint: config.endpoint.clone(),
                filter: config.filter.as_str().to_string(),
                source,
            })?;
        info!(log, "subscribed");

        Ok(Subscriber {
            socket,
            endpoint: config.endpoint.clone(),
            filter: config.filter.clone(),
            log,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Block until the next message matching the filter arrives.
    pub async fn recv(&mut self) -> Result<Message> {
        loop {
            let raw = self.socket.recv().await.map_err(|source| {
                Error::Receive {
                    endpoint: self.endpoint.clone(),
                    source,
                }
            })?;
            let msg = Message::received(raw);

            // SUB sockets filter on receipt as well as at the publisher.
            if self.filter.matches(msg.topic()) {
                trace!(self.log, "received message";
                    "bytes" => msg.payload().len());
                return Ok(msg);
            }
            debug!(self.log, "dropping message outside filter");
        }
    }

    /// Turn the subscriber into a stream of messages. The stream ends after
    /// yielding the first error.
    pub fn messages(self) -> impl Stream<Item = Result<Message>> {
        stream::unfold(Some(self), |state| async move {
            let mut sub = state?;
            match sub.recv().await {
                Ok(msg) => Some((Ok(msg), Some(sub))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Print each message to `out` until `shutdown` resolves or an error
    /// occurs. Returns the number of lines printed.
    pub async fn print_until<W, S>(
        &mut self,
        format: LineFormat,
        out: &mut W,
        shutdown: S,
    ) -> Result<u64>
    where
        W: Write,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut printed = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(self.log, "shutting down"; "printed" => printed);
                    return Ok(printed);
                }
                msg = self.recv() => {
                    let msg = msg?;
                    out.write_all(format.render(&msg).as_bytes())?;
                    out.flush()?;
                    printed += 1;
                }
            }
        }
    }

    /// Close the channel, logging anything the transport reports.
    pub async fn close(self) {
        let Subscriber { socket, log, .. } = self;
        for err in socket.close().await {
            warn!(log, "error while closing subscriber"; "err" => %err);
        }
        debug!(log, "subscriber closed");
    }
}

/// Connect, print messages until `shutdown` resolves, and close the
/// channel on every way out. A shutdown while still connecting returns
/// with nothing printed.
pub async fn run<W, S>(
    config: &SubscriberConfig,
    out: &mut W,
    shutdown: S,
    log: Option<&Logger>,
) -> Result<u64>
where
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut sub = tokio::select! {
        sub = Subscriber::connect(config, log) => sub?,
        _ = &mut shutdown => return Ok(0),
    };
    let result = sub.print_until(config.format, out, shutdown).await;
    sub.close().await;
    result
}
