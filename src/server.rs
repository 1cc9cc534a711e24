//! Host runtime feeding invocations to the roulette command.
//!
//! The [`Server`] reads [`Invocation`]s from a [`ConsoleInput`] and hands each
//! one to the [`RouletteCommand`] in arrival order. Delayed announcements run
//! in the background and do not hold up the next shot. A failed shot is logged
//! and the loop moves on to the next invocation; only input errors end the
//! run early.

use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::command::RouletteCommand;
use crate::error::RouletteError;
use crate::game::Shot;
use crate::platform::{ConsoleInput, Invocation};

/// Counters collected over one [`Server::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Invocations read from the input
    pub invocations: u64,
    /// Shots fired
    pub shots: u64,
    /// Shots that hit
    pub hits: u64,
    /// Accepted invocations whose platform calls failed
    pub failures: u64,
}

impl RunSummary {
    fn record(&mut self, result: &Result<Option<Shot>, RouletteError>) {
        self.invocations += 1;
        match result {
            Ok(Some(shot)) => {
                self.shots += 1;
                if matches!(shot, Shot::Hit { .. }) {
                    self.hits += 1;
                }
            }
            Ok(None) => {}
            Err(_) => self.failures += 1,
        }
    }
}

/// Drives a [`RouletteCommand`] from a console input stream.
pub struct Server<R> {
    input: ConsoleInput<R>,
    command: RouletteCommand,
    cancel: CancellationToken,
}

impl<R> Server<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Creates a server.
    ///
    /// Cancelling `cancel` stops the loop before the next invocation is
    /// read. An invocation already being handled runs to completion.
    #[must_use]
    pub const fn new(
        input: ConsoleInput<R>,
        command: RouletteCommand,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            input,
            command,
            cancel,
        }
    }

    /// Returns the command being served.
    #[must_use]
    pub const fn command(&self) -> &RouletteCommand {
        &self.command
    }

    /// Runs until EOF or cancellation.
    ///
    /// Pending new-round announcements are delivered before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the input fails.
    pub async fn run(&mut self) -> Result<RunSummary, RouletteError> {
        info!(command = %self.command.spec().name, "roulette command registered");
        let mut summary = RunSummary::default();

        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("server cancelled");
                    break;
                }
                next = self.input.next_invocation() => next?,
            };

            let Some(invocation) = next else {
                debug!("input EOF, shutting down");
                break;
            };

            let result = self.dispatch(&invocation).await;
            summary.record(&result);
        }

        self.command.flush_announcements().await;

        info!(
            invocations = summary.invocations,
            shots = summary.shots,
            hits = summary.hits,
            failures = summary.failures,
            "server stopped"
        );
        Ok(summary)
    }

    async fn dispatch(&self, invocation: &Invocation) -> Result<Option<Shot>, RouletteError> {
        let result = self.command.handle(invocation).await;
        if let Err(ref e) = result {
            error!(user = %invocation.user, error = %e, "command failed");
        }
        result
    }
}

impl<R> std::fmt::Debug for Server<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}
