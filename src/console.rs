// Copyright 2020 Joyent, Inc.

//! Line-oriented console used by the requester and publisher REPLs.

use std::io::{self, Write};

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};

use crate::error::{lines_error, Result};

/// Longest input line accepted from the console.
pub const MAX_LINE_LEN: usize = 64 * 1024;

pub const PROMPT: &str = "> ";

pub struct Console<R, W> {
    lines: FramedRead<R, LinesCodec>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Console<R, W> {
        Console {
            lines: FramedRead::new(
                input,
                LinesCodec::new_with_max_length(MAX_LINE_LEN),
            ),
            out,
        }
    }

    /// Print `prompt` and wait for the next line. Returns `None` at end of
    /// input. The line terminator is not part of the returned line.
    pub async fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        self.write(prompt.as_bytes())?;
        match self.lines.next().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(lines_error(e, MAX_LINE_LEN)),
            None => Ok(None),
        }
    }

    /// Write bytes exactly as given and flush.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.write(line.as_bytes())?;
        self.write(b"\n")
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

/// Console over the process's stdin and stdout.
pub fn stdio() -> Console<tokio::io::Stdin, io::Stdout> {
    Console::new(tokio::io::stdin(), io::stdout())
}
