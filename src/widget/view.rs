// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! View sinks the widget writes into

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use super::preview::PreviewRef;
use crate::prediction::{ResultEntry, SelectedFile};
use crate::render;

/// The file-picker control; drops are reflected back into it
pub trait FilePicker: Send {
    fn set_files(&mut self, files: &[SelectedFile]);
}

/// Where the thumbnail goes
pub trait PreviewSink: Send {
    fn show(&mut self, preview: &PreviewRef);
}

/// The results container
pub trait ResultsPanel: Send {
    fn set_visible(&mut self, visible: bool);
}

/// The list of result entries
pub trait ResultList: Send {
    fn replace(&mut self, entries: &[ResultEntry]);
}

/// Region accepting dropped files
pub trait DropZone: Send {
    fn set_highlighted(&mut self, highlighted: bool);
}

/// Recorded view state
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    pub picker_files: Vec<String>,
    pub preview: Option<PreviewRef>,
    pub results_visible: bool,
    pub entries: Vec<ResultEntry>,
    pub highlighted: bool,
    /// Number of times the list was replaced
    pub list_updates: usize,
}

/// In-memory view. Clones share state, so one clone can be handed to the
/// widget while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryView {
    state: Arc<Mutex<ViewSnapshot>>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ViewSnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FilePicker for MemoryView {
    fn set_files(&mut self, files: &[SelectedFile]) {
        self.lock().picker_files = files.iter().map(|f| f.name.clone()).collect();
    }
}

impl PreviewSink for MemoryView {
    fn show(&mut self, preview: &PreviewRef) {
        self.lock().preview = Some(preview.clone());
    }
}

impl ResultsPanel for MemoryView {
    fn set_visible(&mut self, visible: bool) {
        self.lock().results_visible = visible;
    }
}

impl ResultList for MemoryView {
    fn replace(&mut self, entries: &[ResultEntry]) {
        let mut state = self.lock();
        state.entries = entries.to_vec();
        state.list_updates += 1;
    }
}

impl DropZone for MemoryView {
    fn set_highlighted(&mut self, highlighted: bool) {
        self.lock().highlighted = highlighted;
    }
}

/// Logs every view update and records state like [`MemoryView`]
#[derive(Debug, Clone, Default)]
pub struct TerminalView {
    inner: MemoryView,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.inner.snapshot()
    }
}

impl FilePicker for TerminalView {
    fn set_files(&mut self, files: &[SelectedFile]) {
        debug!("File picker now holds {} file(s)", files.len());
        self.inner.set_files(files);
    }
}

impl PreviewSink for TerminalView {
    fn show(&mut self, preview: &PreviewRef) {
        match preview.dimensions {
            Some((w, h)) => info!("Preview: {} ({}, {}x{})", preview.file_name, preview.mime, w, h),
            None => info!("Preview: {} ({})", preview.file_name, preview.mime),
        }
        self.inner.show(preview);
    }
}

impl ResultsPanel for TerminalView {
    fn set_visible(&mut self, visible: bool) {
        self.inner.set_visible(visible);
    }
}

impl ResultList for TerminalView {
    fn replace(&mut self, entries: &[ResultEntry]) {
        for entry in entries {
            info!("{}", render::entry_text(entry));
        }
        self.inner.replace(entries);
    }
}

impl DropZone for TerminalView {
    fn set_highlighted(&mut self, highlighted: bool) {
        if highlighted {
            info!("Drop zone armed");
        }
        self.inner.set_highlighted(highlighted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let view = MemoryView::new();
        let mut handle = view.clone();

        handle.set_visible(true);
        handle.replace(&[ResultEntry::Error { message: "x".into() }]);

        let snapshot = view.snapshot();
        assert!(snapshot.results_visible);
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.list_updates, 1);
    }

    #[test]
    fn test_terminal_view_records_entries() {
        let view = TerminalView::new();
        let mut handle = view.clone();
        handle.replace(&[ResultEntry::Prediction { label: "Cat".into(), confidence: "97%".into() }]);
        assert_eq!(view.snapshot().entries.len(), 1);
    }
}
