// Copyright 2020 Joyent, Inc.

use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::Duration;

use futures::future;
use slog::{debug, info, o, Drain, Level, LevelFilter, Logger};
use tokio::time::{sleep, timeout};
use tokio_test::block_on;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use pubreq::console::Console;
use pubreq::endpoint::Endpoint;
use pubreq::requester::{Requester, RequesterConfig, State};
use pubreq::Error;

const SESSION_LIMIT: Duration = Duration::from_secs(10);

fn test_logger() -> Logger {
    let plain = slog_term::PlainSyncDecorator::new(std::io::stdout());
    Logger::root(
        Mutex::new(LevelFilter::new(
            slog_term::FullFormat::new(plain).build(),
            Level::Info,
        ))
        .fuse(),
        o!("build-id" => "0.1.0"),
    )
}

fn reply_to(request: &str) -> String {
    match request {
        "ping" => String::from("pong\n"),
        "raw" => String::from("raw-reply"),
        other => format!("echo: {}\n", other),
    }
}

/// Serve up to `requests` requests on a REP socket, replying to all but
/// `quit`. Returns the requests in the order they arrived.
#[tokio::main(flavor = "current_thread")]
async fn run_replier(
    port_tx: mpsc::Sender<u16>,
    requests: usize,
    log: Logger,
) -> Vec<String> {
    let mut socket = RepSocket::new();
    let bound = socket
        .bind("tcp://127.0.0.1:0")
        .await
        .expect("failed to bind");
    let port = Endpoint::from(bound).port();
    info!(log, "listening for requests"; "port" => port);
    port_tx.send(port).unwrap();

    let mut received = Vec::new();
    while received.len() < requests {
        let msg = socket.recv().await.expect("failed to receive request");
        let text = String::try_from(msg).expect("request was not a string");
        debug!(log, "handling request"; "request" => &text);
        received.push(text.clone());
        if text == "quit" {
            break;
        }
        socket
            .send(ZmqMessage::from(reply_to(&text)))
            .await
            .expect("failed to send reply");
    }

    // Let the last reply drain before the socket goes away.
    sleep(Duration::from_millis(100)).await;
    socket.close().await;
    received
}

fn start_replier(
    requests: usize,
    log: &Logger,
) -> (thread::JoinHandle<Vec<String>>, RequesterConfig) {
    let (port_tx, port_rx) = mpsc::channel();
    let server_log = log.clone();
    let handle =
        thread::spawn(move || run_replier(port_tx, requests, server_log));
    let port = port_rx.recv().expect("replier failed to start");
    let config = RequesterConfig {
        endpoint: Endpoint::new("127.0.0.1", port),
    };
    (handle, config)
}

#[test]
fn replies_are_printed_verbatim_until_quit() {
    let log = test_logger();
    let (server, config) = start_replier(4, &log);
    let mut console =
        Console::new(&b"ping\nraw\nhello there\nquit\n"[..], Vec::new());

    block_on(async {
        let requester = Requester::connect(&config, Some(&log))
            .await
            .expect("failed to connect");
        // The replier never answers `quit`, so this only finishes if the
        // session ends without receiving.
        timeout(SESSION_LIMIT, requester.run(&mut console, future::pending()))
            .await
            .expect("session did not end after quit")
            .expect("session failed");
    });

    assert_eq!(
        String::from_utf8_lossy(console.output()),
        "> pong\n> raw-reply> echo: hello there\n> "
    );
    assert_eq!(
        server.join().unwrap(),
        vec!["ping", "raw", "hello there", "quit"]
    );
}

#[test]
fn end_of_input_ends_session_without_sending() {
    let log = test_logger();
    let (server, config) = start_replier(1, &log);
    let mut console = Console::new(&b"ping\n"[..], Vec::new());

    block_on(async {
        let requester = Requester::connect(&config, Some(&log))
            .await
            .expect("failed to connect");
        timeout(SESSION_LIMIT, requester.run(&mut console, future::pending()))
            .await
            .expect("session did not end at end of input")
            .expect("session failed");
    });

    assert_eq!(String::from_utf8_lossy(console.output()), "> pong\n> ");
    assert_eq!(server.join().unwrap(), vec!["ping"]);
}

#[test]
fn each_request_alternates_with_one_reply() {
    let log = test_logger();
    let (server, config) = start_replier(3, &log);
    let mut console = Console::new(&b"one\ntwo\nquit\n"[..], Vec::new());

    let states = block_on(async {
        let mut requester = Requester::connect(&config, Some(&log))
            .await
            .expect("failed to connect");
        let mut states = vec![requester.state()];
        while requester.state() != State::Terminated {
            let state = timeout(SESSION_LIMIT, requester.step(&mut console))
                .await
                .expect("step stalled")
                .expect("step failed");
            states.push(state);
        }

        // Stepping a finished session changes nothing.
        let after = requester.step(&mut console).await.expect("step failed");
        assert_eq!(after, State::Terminated);

        requester.close().await;
        states
    });

    assert_eq!(
        states,
        vec![
            State::AwaitingInput,
            State::AwaitingReply,
            State::AwaitingInput,
            State::AwaitingReply,
            State::AwaitingInput,
            State::Terminated,
        ]
    );
    assert_eq!(
        String::from_utf8_lossy(console.output()),
        "> echo: one\n> echo: two\n> "
    );
    assert_eq!(server.join().unwrap(), vec!["one", "two", "quit"]);
}

#[test]
fn shutdown_ends_session() {
    let log = test_logger();
    let (_server, config) = start_replier(1, &log);
    let (_input, reader) = tokio::io::duplex(64);
    let mut console = Console::new(reader, Vec::new());

    block_on(async {
        let requester = Requester::connect(&config, Some(&log))
            .await
            .expect("failed to connect");
        let shutdown = sleep(Duration::from_millis(200));
        timeout(SESSION_LIMIT, requester.run(&mut console, shutdown))
            .await
            .expect("shutdown was ignored")
            .expect("session failed");
    });

    assert_eq!(String::from_utf8_lossy(console.output()), "> ");
}

#[test]
fn unresolvable_host_is_a_connect_error() {
    let log = test_logger();
    let config = RequesterConfig {
        endpoint: Endpoint::new("nosuchhost.invalid", 7000),
    };

    let result = block_on(async {
        timeout(SESSION_LIMIT, Requester::connect(&config, Some(&log)))
            .await
            .expect("connect did not fail")
    });
    match result {
        Err(Error::Connect { endpoint, .. }) => {
            assert_eq!(endpoint, config.endpoint);
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("connected to an unresolvable host"),
    }
}
