//! Background asset loading delivered through channels polled once per frame.
//!
//! The frame loop never waits on a load. A slot stays `Pending` until the worker
//! sends its result; failures are logged once and the slot stays empty for good.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use renderer::{load_model, MeshData, ModelError};

/// Errors from asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("loader for {0} exited without a result")]
    Disconnected(String),
    #[error("could not start loader thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Delivered,
    Failed,
}

/// Receiving end of one asynchronous load.
#[derive(Debug)]
pub struct AssetSlot<T> {
    label: String,
    receiver: Receiver<Result<T, AssetError>>,
    state: SlotState,
}

impl<T> AssetSlot<T> {
    pub fn new(label: impl Into<String>, receiver: Receiver<Result<T, AssetError>>) -> Self {
        Self {
            label: label.into(),
            receiver,
            state: SlotState::Pending,
        }
    }

    /// A slot plus the sender a worker should report to.
    pub fn channel(label: impl Into<String>) -> (Sender<Result<T, AssetError>>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(label, rx))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == SlotState::Pending
    }

    /// Non-blocking check. Yields the asset exactly once.
    pub fn poll(&mut self) -> Option<T> {
        if self.state != SlotState::Pending {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(Ok(asset)) => {
                log::info!("Loaded {}", self.label);
                self.state = SlotState::Delivered;
                Some(asset)
            }
            Ok(Err(e)) => {
                self.fail(&e);
                None
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.fail(&AssetError::Disconnected(self.label.clone()));
                None
            }
        }
    }

    fn fail(&mut self, error: &AssetError) {
        log::error!("Failed to load {}: {}", self.label, error);
        self.state = SlotState::Failed;
    }
}

/// Import a glTF/GLB file on a worker thread.
pub fn spawn_model_load(path: impl Into<PathBuf>) -> AssetSlot<MeshData> {
    let path = path.into();
    let (tx, mut slot) = AssetSlot::channel(path.display().to_string());
    let spawned = std::thread::Builder::new()
        .name("model-loader".into())
        .spawn(move || {
            let result = load_model(&path).map_err(AssetError::from);
            // The receiver may be gone if the game shut down first.
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        slot.fail(&AssetError::from(e));
    }
    slot
}
