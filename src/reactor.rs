// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Single-threaded event loop driving the widget
//!
//! User events and network completions share one queue. Each event runs to
//! completion before the next is taken. Classification calls run as spawned
//! tasks and post their outcome back onto the queue, so a new selection can
//! be handled while an older request is still in flight.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::client::Classifier;
use crate::prediction::{PredictResponse, SelectedFile};
use crate::widget::{Disposition, PendingRequest, UploadWidget, WidgetState};
use crate::PredictorError;

/// Everything the widget reacts to
#[derive(Debug)]
pub enum WidgetEvent {
    FileSelected(Option<SelectedFile>),
    DragEnter,
    DragLeave,
    Drop(Vec<SelectedFile>),
    ResponseReceived { ticket: u64, response: PredictResponse },
    ResponseFailed { ticket: u64, error: PredictorError },
}

/// Cloneable handle for posting events from other tasks
#[derive(Clone)]
pub struct ReactorHandle {
    tx: mpsc::UnboundedSender<WidgetEvent>,
}

impl ReactorHandle {
    /// Queue an event. Returns false once the reactor is gone.
    pub fn post(&self, event: WidgetEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

pub struct Reactor {
    widget: UploadWidget,
    classifier: Arc<dyn Classifier>,
    tx: mpsc::UnboundedSender<WidgetEvent>,
    rx: mpsc::UnboundedReceiver<WidgetEvent>,
}

impl Reactor {
    pub fn new(widget: UploadWidget, classifier: Arc<dyn Classifier>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            widget,
            classifier,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> ReactorHandle {
        ReactorHandle { tx: self.tx.clone() }
    }

    pub fn widget(&self) -> &UploadWidget {
        &self.widget
    }

    /// Handle one event to completion
    pub fn dispatch(&mut self, event: WidgetEvent) -> Disposition {
        match event {
            WidgetEvent::FileSelected(file) => {
                if let Some(request) = self.widget.select_file(file) {
                    self.send(request);
                }
                Disposition::Default
            }
            WidgetEvent::DragEnter => self.widget.handle_drag_enter(),
            WidgetEvent::DragLeave => self.widget.handle_drag_leave(),
            WidgetEvent::Drop(files) => {
                let (disposition, request) = self.widget.handle_drop(files);
                if let Some(request) = request {
                    self.send(request);
                }
                disposition
            }
            WidgetEvent::ResponseReceived { ticket, response } => {
                self.widget.complete(ticket, Ok(response));
                Disposition::Default
            }
            WidgetEvent::ResponseFailed { ticket, error } => {
                self.widget.complete(ticket, Err(error));
                Disposition::Default
            }
        }
    }

    /// Wait for the next event and handle it. False once the queue is closed.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Process queued events until nothing is queued and no request is outstanding
    pub async fn run_until_idle(&mut self) {
        loop {
            let event = match self.rx.try_recv() {
                Ok(event) => event,
                Err(_) if self.widget.state() == WidgetState::Idle => break,
                Err(_) => match self.rx.recv().await {
                    Some(event) => event,
                    None => break,
                },
            };
            self.dispatch(event);
        }
    }

    /// Process events until shutdown is signalled
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => {
                        self.dispatch(event);
                    }
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }

    fn send(&self, request: PendingRequest) {
        let classifier = Arc::clone(&self.classifier);
        let tx = self.tx.clone();
        let PendingRequest { ticket, file } = request;

        debug!("Dispatching request #{} for {}", ticket, file.name);

        tokio::spawn(async move {
            let event = match classifier.classify(&file).await {
                Ok(response) => WidgetEvent::ResponseReceived { ticket, response },
                Err(error) => WidgetEvent::ResponseFailed { ticket, error },
            };
            let _ = tx.send(event);
        });
    }
}
