//! Terminal binding layer: owns the injected controller, renders its
//! observable state, and maps typed commands onto controller behaviour.

use std::{
    io::Write,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context, Result};
use client_core::{
    HttpPredictionClient, PendingRequest, QueryListController, QueryRecord, UpdateOutcome,
};
use futures::future::join_all;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    commands::{parse_command, ConsoleCommand, HELP},
    events::{render_change, render_event, render_record},
};

pub type Output = Arc<Mutex<dyn Write + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    controller: Arc<QueryListController>,
    probe: Option<HttpPredictionClient>,
    out: Output,
    in_flight: Vec<PendingRequest>,
    notices: JoinHandle<()>,
}

fn write_line(out: &Output, line: &str) {
    let mut guard = out.lock().unwrap_or_else(PoisonError::into_inner);
    // A closed terminal is not worth failing a mutation over.
    let _ = writeln!(guard, "{line}");
}

impl Console {
    /// Binds to `controller`: list changes and request failures are written
    /// to `out` as they happen. Must be called inside a tokio runtime.
    pub fn new(
        controller: Arc<QueryListController>,
        probe: Option<HttpPredictionClient>,
        out: Output,
    ) -> Self {
        let change_out = out.clone();
        controller
            .records
            .subscribe(move |change| write_line(&change_out, &render_change(change)));

        let mut events = controller.subscribe_events();
        let event_out = out.clone();
        let notices = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Some(notice) = render_event(&event) {
                            write_line(&event_out, &notice);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "console fell behind controller events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self {
            controller,
            probe,
            out,
            in_flight: Vec::new(),
            notices,
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        match parse_command(line) {
            Ok(command) => self.execute(command).await,
            Err(message) => {
                self.say(&message);
                Ok(Flow::Continue)
            }
        }
    }

    pub async fn execute(&mut self, command: ConsoleCommand) -> Result<Flow> {
        self.in_flight.retain(|pending| !pending.is_finished());

        match command {
            ConsoleCommand::New(text) => {
                if let Some(text) = text {
                    self.controller.pending_text.set(Some(text));
                }
                match self.controller.submit_new() {
                    Ok(pending) => self.in_flight.push(pending),
                    Err(err) => self.say(&format!("ALERT: {err}")),
                }
            }
            ConsoleCommand::Edit(row) => {
                if let Some(record) = self.row(row) {
                    record.begin_edit();
                    self.say(&render_record(row, &record));
                }
            }
            ConsoleCommand::Unedit(row) => {
                if let Some(record) = self.row(row) {
                    if record.text.get().is_empty() {
                        self.say("row text is empty; set new text or save to delete");
                    } else {
                        record.end_edit();
                        self.say(&render_record(row, &record));
                    }
                }
            }
            ConsoleCommand::Set { row, text } => {
                if let Some(record) = self.row(row) {
                    record.begin_edit();
                    record.text.set(text);
                    self.say(&render_record(row, &record));
                }
            }
            ConsoleCommand::Save(row) => {
                if let Some(record) = self.row(row) {
                    match self.controller.submit_update(&record) {
                        UpdateOutcome::Submitted(pending) => self.in_flight.push(pending),
                        UpdateOutcome::Deleted(None) => self.say("nothing removed"),
                        UpdateOutcome::Deleted(Some(_)) => {}
                    }
                }
            }
            ConsoleCommand::Delete(row) => {
                if let Some(record) = self.row(row) {
                    if self.controller.delete_record(&record).is_none() {
                        self.say("nothing removed");
                    }
                }
            }
            ConsoleCommand::List => {
                let records = self.controller.records.snapshot();
                if records.is_empty() {
                    self.say("(no rows)");
                }
                for (position, record) in records.iter().enumerate() {
                    self.say(&render_record(position, record));
                }
            }
            ConsoleCommand::Export => {
                let json = serde_json::to_string_pretty(&self.controller.snapshot())
                    .context("failed to encode rows")?;
                self.say(&json);
            }
            ConsoleCommand::Ping => match &self.probe {
                Some(probe) => match probe.ping().await {
                    Ok(()) => self.say(&format!("service at {} is up", probe.predict_url())),
                    Err(err) => self.say(&format!("ping failed: {err}")),
                },
                None => self.say("no service configured for ping"),
            },
            ConsoleCommand::Help => self.say(HELP),
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Waits for every outstanding request, then detaches from the controller.
    pub async fn shutdown(mut self) {
        let pending = std::mem::take(&mut self.in_flight);
        if !pending.is_empty() {
            info!(count = pending.len(), "waiting for outstanding prediction requests");
        }
        let outcomes = join_all(pending.into_iter().map(PendingRequest::wait)).await;
        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        debug!(failed, "outstanding requests settled");
        // Let the notice task flush anything the final completions produced.
        tokio::task::yield_now().await;
        self.notices.abort();
    }

    fn row(&self, row: usize) -> Option<Arc<QueryRecord>> {
        let record = self.controller.records.get(row);
        if record.is_none() {
            self.say(&format!("no row #{}", row + 1));
        }
        record
    }

    fn say(&self, line: &str) {
        write_line(&self.out, line);
    }
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
