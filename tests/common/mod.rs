// Shared fixtures for controller integration tests
//
// A harness wires the controller to synthetic providers, a manual encoder
// and a manual clock so tests decide exactly when time passes and what the
// encoder delivers.

#![allow(dead_code)]

use screen_recorder::{
    ArtifactStore, Backends, EncoderProbe, ManualClock, RecordingSessionController, SessionConfig,
    SyntheticDisplay, SyntheticEncoderFactory, SyntheticMicrophone,
};
use std::sync::Arc;

pub struct Harness {
    pub controller: RecordingSessionController,
    pub display: Arc<SyntheticDisplay>,
    pub mic: Arc<SyntheticMicrophone>,
    pub probe: EncoderProbe,
    pub clock: ManualClock,
    pub store: Arc<ArtifactStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let display = Arc::new(SyntheticDisplay::new());
        let mic = Arc::new(SyntheticMicrophone::new());
        Self::with_providers(config, display, mic)
    }

    pub fn with_providers(
        config: SessionConfig,
        display: Arc<SyntheticDisplay>,
        mic: Arc<SyntheticMicrophone>,
    ) -> Self {
        let encoder = SyntheticEncoderFactory::manual();
        let probe = encoder.probe();
        let clock = ManualClock::new();
        let store = Arc::new(ArtifactStore::new());

        let backends = Backends {
            display: display.clone(),
            microphone: mic.clone(),
            encoder: Arc::new(encoder),
        };
        let controller = RecordingSessionController::new(config, backends)
            .with_clock(Arc::new(clock.clone()))
            .with_artifact_store(Arc::clone(&store));

        Self {
            controller,
            display,
            mic,
            probe,
            clock,
            store,
        }
    }

    /// Let `n` whole seconds pass, sampling after each one
    pub fn advance_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.clock.advance_secs(1);
            self.controller.tick();
        }
    }

    /// Live tracks across both providers
    pub fn live_tracks(&self) -> usize {
        self.display.live_tracks() + self.mic.live_tracks()
    }
}
