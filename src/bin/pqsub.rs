// Copyright 2020 Joyent, Inc.

use std::env;
use std::io;

use slog::info;

use pubreq::{cli, logging, signal, subscriber};

static APP: &str = "pqsub";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opts = cli::subscriber_options(env::args_os())
        .unwrap_or_else(|e| cli::exit_with_usage(e));
    let log = logging::stderr_logger(opts.log_level, APP);

    println!("Receiving updates from {}...", opts.config.endpoint);

    let mut out = io::stdout();
    match subscriber::run(&opts.config, &mut out, signal::interrupted(), Some(&log))
        .await
    {
        Ok(printed) => info!(log, "subscriber finished"; "printed" => printed),
        Err(e) => cli::exit_with_error(&e, Some(&log)),
    }
}
