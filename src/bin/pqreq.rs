// Copyright 2020 Joyent, Inc.

use std::env;
use std::process;

use pubreq::requester::Requester;
use pubreq::{cli, console, logging, signal};

static APP: &str = "pqreq";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opts = cli::requester_options(env::args_os())
        .unwrap_or_else(|e| cli::exit_with_usage(e));
    let log = logging::stderr_logger(opts.log_level, APP);
    let endpoint = &opts.config.endpoint;

    println!(
        "Attempting to connect to {} on port {}...",
        endpoint.host(),
        endpoint.port()
    );
    let requester = tokio::select! {
        r = Requester::connect(&opts.config, Some(&log)) => {
            r.unwrap_or_else(|e| cli::exit_with_error(&e, Some(&log)))
        }
        _ = signal::interrupted() => process::exit(0),
    };
    println!("Connected.");
    println!("Type a request at the prompt, or quit to exit.");

    let mut console = console::stdio();
    if let Err(e) = requester.run(&mut console, signal::interrupted()).await {
        cli::exit_with_error(&e, Some(&log));
    }

    // An interrupted prompt leaves a blocking stdin read behind, which
    // would hold up runtime shutdown.
    process::exit(0)
}
