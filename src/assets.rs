//! Asynchronous model asset loading.
//!
//! Each scene asset is one [`AssetHandle`]: a load request fired exactly once
//! at composer construction, parsed on a background thread, with the result
//! handed back to the frame thread over an `mpsc` channel. The frame loop
//! calls [`AssetHandle::poll`] once per frame; the handle transitions
//! `Unloaded -> Loaded | Failed` exactly once and never resets.
//!
//! Failure is non-fatal by design: a failed handle just reports its message
//! and the rest of the scene keeps rendering. There is no retry and no
//! timeout; a load either eventually succeeds or eventually fails.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::model::Model;
use crate::overlay::Color;

/// Lifecycle of one externally loaded model.
#[derive(Debug)]
pub enum AssetState {
    /// Load requested, result not yet arrived.
    Unloaded,
    /// Parsed and ready to attach.
    Loaded(Model),
    /// Load failed; the message is shown in the scene overlay.
    Failed(String),
}

/// Handle to one in-flight or completed asset load.
pub struct AssetHandle {
    label: String,
    state: AssetState,
    pending: Option<Receiver<Result<Model, String>>>,
}

impl AssetHandle {
    /// Issues the load request on a background thread.
    ///
    /// `recolor` is the optional one-time post-load reshade: when set, every
    /// part's surface color is forced before the model is handed over.
    pub fn spawn(label: impl Into<String>, path: PathBuf, recolor: Option<Color>) -> Self {
        let label = label.into();
        let (tx, rx) = mpsc::channel();

        let thread_label = label.clone();
        thread::spawn(move || {
            let result = Model::load(&path)
                .map(|mut model| {
                    if let Some(color) = recolor {
                        model.force_color(color);
                    }
                    model
                })
                .map_err(|e| format!("Failed to load {} model: {}", thread_label, e));
            // The viewer may have shut down before the load finished.
            let _ = tx.send(result);
        });

        Self {
            label,
            state: AssetState::Unloaded,
            pending: Some(rx),
        }
    }

    /// Drains the completion channel, transitioning at most once.
    ///
    /// Must be called from the frame thread; this is the marshalling point
    /// between the loader thread and all scene state. Returns `true` on the
    /// frame the transition happens.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };

        let outcome = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                Err(format!("{} loader thread exited unexpectedly", self.label))
            }
        };

        self.pending = None;
        match outcome {
            Ok(model) => {
                log::info!(
                    "{} model loaded: {} parts, {} vertices",
                    self.label,
                    model.parts.len(),
                    model.vertex_count()
                );
                self.state = AssetState::Loaded(model);
            }
            Err(message) => {
                log::error!("{}", message);
                self.state = AssetState::Failed(message);
            }
        }
        true
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> &AssetState {
        &self.state
    }

    /// The loaded model, if the load has succeeded.
    pub fn model(&self) -> Option<&Model> {
        match &self.state {
            AssetState::Loaded(model) => Some(model),
            _ => None,
        }
    }

    /// The failure message, if the load has failed.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            AssetState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Handle wired to a caller-held sender instead of a loader thread.
    #[cfg(test)]
    pub(crate) fn with_channel(
        label: impl Into<String>,
    ) -> (Self, mpsc::Sender<Result<Model, String>>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                label: label.into(),
                state: AssetState::Unloaded,
                pending: Some(rx),
            },
            tx,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_unloaded_until_the_result_arrives() {
        let (mut handle, _tx) = AssetHandle::with_channel("probe");
        assert!(!handle.poll());
        assert!(matches!(handle.state(), AssetState::Unloaded));
    }

    #[test]
    fn transitions_to_loaded_exactly_once() {
        let (mut handle, tx) = AssetHandle::with_channel("probe");
        tx.send(Ok(Model::default())).unwrap();

        assert!(handle.poll());
        assert!(handle.model().is_some());

        // Later polls are no-ops; the state never resets.
        assert!(!handle.poll());
        assert!(handle.model().is_some());
    }

    #[test]
    fn failure_records_a_readable_message() {
        let (mut handle, tx) = AssetHandle::with_channel("probe");
        tx.send(Err("Failed to load probe model: Parse error".into()))
            .unwrap();

        assert!(handle.poll());
        assert_eq!(
            handle.error(),
            Some("Failed to load probe model: Parse error")
        );
        assert!(handle.model().is_none());
    }

    #[test]
    fn dead_loader_thread_counts_as_failure() {
        let (mut handle, tx) = AssetHandle::with_channel("probe");
        drop(tx);

        assert!(handle.poll());
        assert!(handle.error().unwrap().contains("loader thread"));
    }

    #[test]
    fn spawn_reports_missing_file_through_the_channel() {
        let mut handle = AssetHandle::spawn(
            "probe",
            PathBuf::from("definitely/not/here.obj"),
            Some(Color::RED),
        );
        // The loader thread fails fast on a missing file.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while !handle.poll() {
            assert!(std::time::Instant::now() < deadline, "load never resolved");
            std::thread::yield_now();
        }
        assert!(handle.error().unwrap().contains("probe"));
    }
}
