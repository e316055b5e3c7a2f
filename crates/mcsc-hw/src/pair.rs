//! The two engines of a scaler pair and their shared resources

use std::sync::Arc;

use mcsc_core::config::Config;
use mcsc_core::{create_frame_event_channel, EngineId, FrameEventReceiver, RegisterAccess};

use crate::engine::McscEngine;
use crate::shared::PairShared;

/// An engine pair. Both engines hold the same [`PairShared`].
pub struct McscPair {
    shared: Arc<PairShared>,
    engines: [McscEngine; 2],
}

impl McscPair {
    /// Build the pair over two register banks. Completion events of both
    /// engines arrive on the returned receiver.
    pub fn new(
        config: Config,
        regs0: Arc<dyn RegisterAccess>,
        regs1: Arc<dyn RegisterAccess>,
    ) -> (Self, FrameEventReceiver) {
        let (tx, rx) = create_frame_event_channel(config.pipeline.event_queue_capacity);
        let shared = Arc::new(PairShared::new(config, [regs0, regs1]));
        let engines = [
            McscEngine::new(EngineId::Mcsc0, Arc::clone(&shared), tx.clone()),
            McscEngine::new(EngineId::Mcsc1, Arc::clone(&shared), tx),
        ];
        tracing::info!(
            "MCSC pair created (shared output {})",
            shared.cap().enable_shared_output
        );
        (Self { shared, engines }, rx)
    }

    pub fn engine(&self, id: EngineId) -> &McscEngine {
        &self.engines[id.index()]
    }

    pub fn engines(&self) -> impl Iterator<Item = &McscEngine> {
        self.engines.iter()
    }

    pub fn shared(&self) -> &Arc<PairShared> {
        &self.shared
    }
}
