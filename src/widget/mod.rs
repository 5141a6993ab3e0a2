// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The upload widget
//!
//! Owns the selected file, the results panel visibility and the result list.
//! Operations are synchronous: selecting a file updates the view at once and
//! hands back a [`PendingRequest`] for the caller to dispatch. The outcome of
//! that request comes back through [`UploadWidget::complete`].

pub mod preview;
pub mod view;

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::config::{RacePolicy, WidgetConfig};
use crate::prediction::{PredictResponse, ResultEntry, SelectedFile};
use crate::{PredictorError, Result};
use preview::PreviewRef;
use view::{DropZone, FilePicker, PreviewSink, ResultList, ResultsPanel};

/// Handles to the sinks the widget drives, built once
pub struct WidgetContext {
    pub picker: Box<dyn FilePicker>,
    pub preview: Box<dyn PreviewSink>,
    pub results: Box<dyn ResultsPanel>,
    pub list: Box<dyn ResultList>,
    pub drop_zone: Option<Box<dyn DropZone>>,
}

impl WidgetContext {
    /// Use one view object for every sink, drop zone included
    pub fn from_view<V>(view: &V) -> Self
    where
        V: FilePicker + PreviewSink + ResultsPanel + ResultList + DropZone + Clone + 'static,
    {
        Self {
            picker: Box::new(view.clone()),
            preview: Box::new(view.clone()),
            results: Box::new(view.clone()),
            list: Box::new(view.clone()),
            drop_zone: Some(Box::new(view.clone())),
        }
    }

    /// Drop the drop zone; only the picker remains as input
    pub fn without_drop_zone(mut self) -> Self {
        self.drop_zone = None;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Idle,
    AwaitingResponse {
        /// Ticket of the newest request issued
        latest: u64,
        /// Requests issued but not yet completed
        outstanding: usize,
    },
}

/// What the host should do with the platform's default action for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    PreventDefault,
    Default,
    Ignored,
}

/// A classification call the widget wants made
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub ticket: u64,
    pub file: SelectedFile,
}

pub struct UploadWidget {
    ctx: WidgetContext,
    config: WidgetConfig,
    selected: Option<SelectedFile>,
    preview: Option<PreviewRef>,
    next_ticket: u64,
    /// Tickets issued and not yet completed
    in_flight: BTreeSet<u64>,
}

impl UploadWidget {
    pub fn new(ctx: WidgetContext, config: WidgetConfig) -> Self {
        Self {
            ctx,
            config,
            selected: None,
            preview: None,
            next_ticket: 1,
            in_flight: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> WidgetState {
        if self.in_flight.is_empty() {
            WidgetState::Idle
        } else {
            WidgetState::AwaitingResponse {
                latest: self.next_ticket - 1,
                outstanding: self.in_flight.len(),
            }
        }
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewRef> {
        self.preview.as_ref()
    }

    pub fn has_drop_zone(&self) -> bool {
        self.ctx.drop_zone.is_some()
    }

    /// A file was chosen in the picker. `None` is a no-op.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Option<PendingRequest> {
        let Some(file) = file else {
            debug!("{}, ignoring", PredictorError::NoFileSelected);
            return None;
        };

        info!("Selected {} ({} bytes)", file.name, file.bytes.len());

        let preview = PreviewRef::from_file(&file);
        self.ctx.preview.show(&preview);
        self.preview = Some(preview);

        self.ctx.results.set_visible(true);
        self.ctx.list.replace(&[ResultEntry::Analyzing {
            message: self.config.analyzing_message.clone(),
        }]);

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight.insert(ticket);

        self.selected = Some(file.clone());
        Some(PendingRequest { ticket, file })
    }

    pub fn handle_drag_enter(&mut self) -> Disposition {
        match self.ctx.drop_zone.as_mut() {
            Some(zone) => {
                zone.set_highlighted(true);
                Disposition::PreventDefault
            }
            None => Disposition::Ignored,
        }
    }

    pub fn handle_drag_leave(&mut self) -> Disposition {
        match self.ctx.drop_zone.as_mut() {
            Some(zone) => {
                zone.set_highlighted(false);
                Disposition::Default
            }
            None => Disposition::Ignored,
        }
    }

    /// Files were dropped. Only the first one is used.
    pub fn handle_drop(&mut self, files: Vec<SelectedFile>) -> (Disposition, Option<PendingRequest>) {
        let Some(zone) = self.ctx.drop_zone.as_mut() else {
            return (Disposition::Ignored, None);
        };
        zone.set_highlighted(false);

        let dropped = files.len();
        let Some(first) = files.into_iter().next() else {
            debug!("Drop carried no files");
            return (Disposition::PreventDefault, None);
        };
        if dropped > 1 {
            debug!("Drop carried {} files, using {}", dropped, first.name);
        }

        self.ctx.picker.set_files(std::slice::from_ref(&first));
        (Disposition::PreventDefault, self.select_file(Some(first)))
    }

    /// Apply the outcome of a request. Returns false if it was discarded as
    /// stale, or if the ticket is not in flight (unknown or already completed).
    pub fn complete(&mut self, ticket: u64, outcome: Result<PredictResponse>) -> bool {
        if !self.in_flight.remove(&ticket) {
            warn!("Completion for request #{} which is not in flight, ignoring", ticket);
            return false;
        }
        let latest = self.next_ticket - 1;

        if self.config.race_policy == RacePolicy::LatestRequestWins && ticket != latest {
            debug!("Discarding stale response #{} (latest is #{})", ticket, latest);
            return false;
        }

        let entries = match outcome {
            Ok(response) => {
                if let PredictResponse::Error { ref error, .. } = response {
                    warn!("Prediction service reported an error: {}", error);
                }
                response.into_entries()
            }
            Err(e) => {
                error_cause(ticket, &e);
                vec![ResultEntry::Error {
                    message: self.config.connection_error_message.clone(),
                }]
            }
        };

        self.ctx.list.replace(&entries);
        true
    }
}

fn error_cause(ticket: u64, e: &PredictorError) {
    if e.is_transport_failure() {
        warn!("Request #{} failed: {}", ticket, e);
    } else {
        tracing::error!("Request #{} failed unexpectedly: {}", ticket, e);
    }
}
