// Copyright 2020 Joyent, Inc.

use std::env;
use std::process;

use pubreq::publisher::Publisher;
use pubreq::{cli, console, logging, signal};

static APP: &str = "pqpub";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opts = cli::publisher_options(env::args_os())
        .unwrap_or_else(|e| cli::exit_with_usage(e));
    let log = logging::stderr_logger(opts.log_level, APP);

    let publisher = Publisher::bind(&opts.config, Some(&log))
        .await
        .unwrap_or_else(|e| cli::exit_with_error(&e, Some(&log)));
    println!(
        "Publishing on {}. Type help for a list of commands.",
        publisher.endpoint()
    );

    let mut console = console::stdio();
    let result = publisher.run(&mut console, signal::interrupted()).await;
    println!("Thanks for using pqpub! Exiting...");

    if let Err(e) = result {
        cli::exit_with_error(&e, Some(&log));
    }

    // An interrupted prompt leaves a blocking stdin read behind, which
    // would hold up runtime shutdown.
    process::exit(0)
}
