// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! A watched directory acting as the widget's drop zone
//!
//! A file appearing in the folder is "dragged over" the widget; once it stops
//! growing it is dropped. If it disappears first, the drag leaves.

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::prediction::SelectedFile;
use crate::reactor::{ReactorHandle, WidgetEvent};
use crate::Result;

/// Events emitted by the drop folder
#[derive(Debug, Clone)]
pub enum FolderEvent {
    /// A new file showed up
    FileArrived(PathBuf),
    /// Watcher error
    Error(String),
}

pub struct DropFolder {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
    event_rx: Receiver<notify::Result<Event>>,
}

impl DropFolder {
    /// Start watching a directory, creating it if needed
    pub fn new(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            info!("Created drop folder: {:?}", dir);
        }

        let (tx, rx) = channel();
        let config = Config::default()
            .with_poll_interval(Duration::from_secs(2));
        let mut watcher = RecommendedWatcher::new(tx, config)?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!("Watching drop folder: {:?}", dir);

        Ok(Self {
            _watcher: watcher,
            dir: dir.to_path_buf(),
            event_rx: rx,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the next event (blocking with timeout)
    pub fn next_event(&self, timeout: Duration) -> Option<FolderEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(Ok(event)) => Self::convert_event(event),
            Ok(Err(e)) => Some(FolderEvent::Error(e.to_string())),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => None,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                Some(FolderEvent::Error("Watcher disconnected".to_string()))
            }
        }
    }

    fn convert_event(event: Event) -> Option<FolderEvent> {
        let arrived = match event.kind {
            EventKind::Create(_) => event.paths.first(),
            // Destination of a move, from outside or within the folder
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.first(),
            _ => None,
        };

        arrived
            .filter(|p| should_process(p))
            .map(|p| FolderEvent::FileArrived(p.clone()))
    }
}

/// Check if a file in the drop folder should be offered to the widget
pub fn should_process(path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };

    // Hidden files
    if filename.starts_with('.') {
        return false;
    }

    // Partial downloads
    let temp_extensions = [".tmp", ".part", ".crdownload", ".partial", ".download"];
    if temp_extensions.iter().any(|ext| filename.ends_with(ext)) {
        return false;
    }

    let skip_names = ["desktop.ini", "thumbs.db", ".ds_store"];
    !skip_names.iter().any(|n| filename.eq_ignore_ascii_case(n))
}

/// Wait for file to be stable (not being written). False if it vanished.
pub async fn wait_for_stable(path: &Path, max_wait: Duration) -> bool {
    let check_interval = Duration::from_millis(500);
    let start = std::time::Instant::now();

    let mut last_size = match tokio::fs::metadata(path).await {
        Ok(m) => m.len(),
        Err(_) => return false,
    };

    loop {
        tokio::time::sleep(check_interval).await;

        let current_size = match tokio::fs::metadata(path).await {
            Ok(m) => m.len(),
            Err(_) => return false,
        };

        if current_size == last_size {
            return true;
        }

        if start.elapsed() > max_wait {
            warn!("File stability check timed out for {:?}", path);
            return true;
        }

        last_size = current_size;
        debug!("File {:?} still being written, size: {}", path, current_size);
    }
}

/// Drag a newly arrived file over the widget and drop it once it is complete
pub async fn deliver(path: PathBuf, handle: ReactorHandle, max_wait: Duration) -> Result<()> {
    handle.post(WidgetEvent::DragEnter);

    if !wait_for_stable(&path, max_wait).await {
        debug!("File disappeared before drop: {:?}", path);
        handle.post(WidgetEvent::DragLeave);
        return Ok(());
    }

    match SelectedFile::from_path(&path).await {
        Ok(file) => {
            handle.post(WidgetEvent::Drop(vec![file]));
            Ok(())
        }
        Err(e) => {
            handle.post(WidgetEvent::DragLeave);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Classifier;
    use crate::config::WidgetConfig;
    use crate::prediction::{PredictResponse, Prediction, ResultEntry};
    use crate::reactor::Reactor;
    use crate::widget::view::MemoryView;
    use crate::widget::{UploadWidget, WidgetContext};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoName;

    #[async_trait]
    impl Classifier for EchoName {
        async fn classify(&self, file: &SelectedFile) -> crate::Result<PredictResponse> {
            Ok(PredictResponse::Predictions(vec![Prediction::new(file.name.clone(), "100%")]))
        }
    }

    fn reactor() -> (Reactor, MemoryView) {
        let view = MemoryView::new();
        let widget = UploadWidget::new(WidgetContext::from_view(&view), WidgetConfig::default());
        (Reactor::new(widget, Arc::new(EchoName)), view)
    }

    #[test]
    fn test_should_process() {
        assert!(should_process(Path::new("/drop/leaf.jpg")));
        assert!(!should_process(Path::new("/drop/.hidden.png")));
        assert!(!should_process(Path::new("/drop/leaf.jpg.crdownload")));
        assert!(!should_process(Path::new("/drop/Thumbs.db")));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_stable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!wait_for_stable(&dir.path().join("gone.png"), Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_deliver_drops_file_into_widget() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        std::fs::write(&path, b"pixels").unwrap();

        let (mut reactor, view) = reactor();
        deliver(path, reactor.handle(), Duration::from_secs(2)).await.unwrap();
        reactor.run_until_idle().await;

        let snapshot = view.snapshot();
        assert!(!snapshot.highlighted);
        assert_eq!(snapshot.picker_files, vec!["leaf.png".to_string()]);
        assert_eq!(
            snapshot.entries,
            vec![ResultEntry::Prediction { label: "leaf.png".into(), confidence: "100%".into() }]
        );
    }

    #[tokio::test]
    async fn test_vanished_file_leaves_without_drop() {
        let dir = tempfile::tempdir().unwrap();
        let (mut reactor, view) = reactor();

        deliver(dir.path().join("never.png"), reactor.handle(), Duration::from_secs(1)).await.unwrap();
        reactor.run_until_idle().await;

        let snapshot = view.snapshot();
        assert!(!snapshot.highlighted);
        assert_eq!(snapshot.list_updates, 0);
    }

    fn drain(folder: &DropFolder) -> Vec<PathBuf> {
        let mut arrived = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(3);
        while std::time::Instant::now() < deadline {
            if let Some(FolderEvent::FileArrived(path)) = folder.next_event(Duration::from_millis(100)) {
                arrived.push(path);
                break;
            }
        }
        arrived
    }

    #[test]
    fn test_file_moved_into_folder_arrives() {
        let outside = tempfile::tempdir().unwrap();
        let source = outside.path().join("leaf.png");
        std::fs::write(&source, b"pixels").unwrap();

        let root = tempfile::tempdir().unwrap();
        let folder = DropFolder::new(root.path()).unwrap();
        let target = root.path().join("leaf.png");
        std::fs::rename(&source, &target).unwrap();

        let arrived = drain(&folder);
        assert_eq!(arrived.len(), 1);
        assert_eq!(arrived[0].file_name(), target.file_name());
    }

    #[test]
    fn test_file_created_in_folder_arrives() {
        let root = tempfile::tempdir().unwrap();
        let folder = DropFolder::new(root.path()).unwrap();
        std::fs::write(root.path().join("cat.jpg"), b"jpeg").unwrap();

        let arrived = drain(&folder);
        assert_eq!(arrived.len(), 1);
        assert_eq!(arrived[0].file_name().and_then(|n| n.to_str()), Some("cat.jpg"));
    }

    #[test]
    fn test_drop_folder_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("incoming");
        let folder = DropFolder::new(&target).unwrap();
        assert!(target.is_dir());
        assert_eq!(folder.dir(), target.as_path());
        assert!(folder.next_event(Duration::from_millis(10)).is_none());
    }
}
