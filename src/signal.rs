// Copyright 2020 Joyent, Inc.

use futures::future;

/// Resolves when the process receives Ctrl-C. If the handler cannot be
/// installed this never resolves, leaving the process to the default
/// signal disposition.
pub async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        future::pending::<()>().await;
    }
}
