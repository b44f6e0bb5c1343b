// Copyright 2020 Joyent, Inc.

//! Command-line parsing for the `pqsub`, `pqreq` and `pqpub` binaries.
//!
//! Each parser turns the raw process arguments into an immutable
//! configuration value. Wrong argument counts and malformed values come back
//! as `Error::Usage` carrying the usage line; `--help` and `--version` come
//! back as `Error::Clap`.

use std::ffi::OsString;
use std::process;

use clap::{crate_version, App, Arg, ArgMatches, ErrorKind};
use slog::{error, Level, Logger};

use crate::endpoint::{
    self, Endpoint, BIND_ALL_HOST, DEFAULT_REQUESTER_HOST,
    DEFAULT_REQUESTER_PORT, DEFAULT_SUBSCRIBER_HOST, DEFAULT_SUBSCRIBER_PORT,
};
use crate::error::{Error, Result};
use crate::logging;
use crate::message::{LineFormat, TopicFilter};
use crate::publisher::PublisherConfig;
use crate::requester::RequesterConfig;
use crate::subscriber::SubscriberConfig;

pub const SUBSCRIBER_USAGE: &str =
    "Usage: pqsub [-t] [-f TOPIC] [-v...] [PORT | HOST:PORT]";
pub const REQUESTER_USAGE: &str = "Usage: pqreq [-v...] [HOST] [PORT]";
pub const PUBLISHER_USAGE: &str = "Usage: pqpub [-v...] PORT";

/// Parsed command line: the component configuration plus the log level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options<C> {
    pub config: C,
    pub log_level: Level,
}

fn verbose_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("verbose")
        .help("Log more detail to stderr (repeat for more)")
        .long("verbose")
        .short("v")
        .multiple(true)
}

fn base_app<'a, 'b>(name: &'static str, about: &'static str) -> App<'a, 'b> {
    App::new(name)
        .about(about)
        .version(crate_version!())
}

pub fn subscriber_app<'a, 'b>() -> App<'a, 'b> {
    base_app("pqsub", "Print messages published to a ZeroMQ endpoint")
        .arg(
            Arg::with_name("endpoint")
                .help("PORT or HOST:PORT to subscribe to (Default: localhost:6000)")
                .index(1),
        )
        .arg(
            Arg::with_name("filter")
                .help("Only print messages whose topic starts with TOPIC")
                .long("filter")
                .short("f")
                .takes_value(true)
                .value_name("TOPIC"),
        )
        .arg(
            Arg::with_name("timestamps")
                .help("Prefix each message with its arrival time")
                .long("timestamps")
                .short("t"),
        )
        .arg(verbose_arg())
}

pub fn requester_app<'a, 'b>() -> App<'a, 'b> {
    base_app("pqreq", "Send console lines to a ZeroMQ reply server")
        .arg(
            Arg::with_name("host")
                .help("DNS name or IP address of the server (Default: localhost)")
                .index(1),
        )
        .arg(
            Arg::with_name("port")
                .help("TCP port of the server (Default: 6500)")
                .index(2),
        )
        .arg(verbose_arg())
}

pub fn publisher_app<'a, 'b>() -> App<'a, 'b> {
    base_app("pqpub", "Broadcast text files to ZeroMQ subscribers")
        .arg(
            Arg::with_name("port")
                .help("TCP port to publish on")
                .index(1)
                .required(true),
        )
        .arg(verbose_arg())
}

/// Run `app` over `args`, mapping every parse failure except help and
/// version output to a usage error.
fn matches_or_usage<'a, I, T>(
    app: App<'a, '_>,
    args: I,
    usage: &str,
) -> Result<ArgMatches<'a>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    app.get_matches_from_safe(args).map_err(|e| match e.kind {
        ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => Error::Clap(e),
        _ => Error::Usage(usage.to_string()),
    })
}

/// Wrap a value error so the usage line follows the explanation.
fn with_usage(err: Error, usage: &str) -> Error {
    match err {
        Error::Usage(msg) => Error::Usage(format!("{}\n{}", msg, usage)),
        other => other,
    }
}

fn log_level(matches: &ArgMatches) -> Level {
    logging::level_from_verbosity(matches.occurrences_of("verbose"))
}

pub fn subscriber_options<I, T>(args: I) -> Result<Options<SubscriberConfig>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = matches_or_usage(subscriber_app(), args, SUBSCRIBER_USAGE)?;

    let endpoint = match matches.value_of("endpoint") {
        Some(arg) => Endpoint::from_arg(arg, DEFAULT_SUBSCRIBER_HOST)
            .map_err(|e| with_usage(e, SUBSCRIBER_USAGE))?,
        None => Endpoint::new(DEFAULT_SUBSCRIBER_HOST, DEFAULT_SUBSCRIBER_PORT),
    };
    let filter = matches
        .value_of("filter")
        .map(TopicFilter::new)
        .unwrap_or_else(TopicFilter::everything);
    let format = if matches.is_present("timestamps") {
        LineFormat::Timestamped
    } else {
        LineFormat::Plain
    };

    Ok(Options {
        config: SubscriberConfig {
            endpoint,
            filter,
            format,
        },
        log_level: log_level(&matches),
    })
}

pub fn requester_options<I, T>(args: I) -> Result<Options<RequesterConfig>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = matches_or_usage(requester_app(), args, REQUESTER_USAGE)?;

    let host = matches.value_of("host").unwrap_or(DEFAULT_REQUESTER_HOST);
    let port = match matches.value_of("port") {
        Some(arg) => endpoint::parse_port(arg)
            .map_err(|e| with_usage(e, REQUESTER_USAGE))?,
        None => DEFAULT_REQUESTER_PORT,
    };

    Ok(Options {
        config: RequesterConfig {
            endpoint: Endpoint::new(host, port),
        },
        log_level: log_level(&matches),
    })
}

pub fn publisher_options<I, T>(args: I) -> Result<Options<PublisherConfig>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = matches_or_usage(publisher_app(), args, PUBLISHER_USAGE)?;

    // Required by the app definition, so present once parsing succeeded.
    let port = endpoint::parse_port(matches.value_of("port").unwrap_or(""))
        .map_err(|e| with_usage(e, PUBLISHER_USAGE))?;

    Ok(Options {
        config: PublisherConfig {
            endpoint: Endpoint::new(BIND_ALL_HOST, port),
        },
        log_level: log_level(&matches),
    })
}

/// Report a command-line problem and exit: help and version output exit 0,
/// usage errors print the usage line to stdout and exit 1.
pub fn exit_with_usage(err: Error) -> ! {
    match err {
        Error::Clap(e) => e.exit(),
        Error::Usage(msg) => {
            println!("{}", msg);
            process::exit(1)
        }
        other => exit_with_error(&other, None),
    }
}

/// Report a runtime failure on stderr and exit 1.
pub fn exit_with_error(err: &Error, log: Option<&Logger>) -> ! {
    if let Some(log) = log {
        error!(log, "exiting on error"; "err" => %err);
    }
    eprintln!("Error: {}", err);
    process::exit(1)
}
