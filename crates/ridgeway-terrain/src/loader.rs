//! Background terrain generation with a one-time readiness gate

use std::sync::Arc;
use std::thread;

use crossbeam::channel::{self, Receiver, TryRecvError};
use ridgeway_core::{Result, RidgewayError};

use crate::config::TerrainConfig;
use crate::surface::TerrainSurface;

enum LoadState {
    Pending(Receiver<Result<TerrainSurface>>),
    Ready(Arc<TerrainSurface>),
    Failed(String),
}

/// Runs generation on a worker thread so the caller's frame loop can keep
/// ticking. Poll [`TerrainLoader::try_ready`] once per frame, or block on
/// [`TerrainLoader::wait`].
pub struct TerrainLoader {
    state: LoadState,
}

impl TerrainLoader {
    pub fn spawn(config: TerrainConfig) -> Self {
        let (tx, rx) = channel::bounded(1);
        let worker_config = config.clone();

        let spawned = thread::Builder::new()
            .name("ridgeway-terrain".to_string())
            .spawn(move || {
                let result = TerrainSurface::generate(&worker_config);
                // The loader may have been dropped; nobody is waiting then
                let _ = tx.send(result);
            });

        match spawned {
            Ok(_) => Self {
                state: LoadState::Pending(rx),
            },
            Err(e) => {
                log::warn!("Could not start terrain worker ({}), generating inline", e);
                Self::from_result(TerrainSurface::generate(&config))
            }
        }
    }

    fn from_result(result: Result<TerrainSurface>) -> Self {
        let state = match result {
            Ok(surface) => LoadState::Ready(Arc::new(surface)),
            Err(e) => LoadState::Failed(e.to_string()),
        };
        Self { state }
    }

    fn poll(&mut self) {
        let next = match &self.state {
            LoadState::Pending(rx) => match rx.try_recv() {
                Ok(result) => Some(Self::from_result(result).state),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(LoadState::Failed(
                    "terrain worker exited without a result".to_string(),
                )),
            },
            _ => None,
        };
        if let Some(state) = next {
            self.state = state;
        }
    }

    /// Whether generation has finished, successfully or not
    pub fn is_ready(&mut self) -> bool {
        self.poll();
        !matches!(self.state, LoadState::Pending(_))
    }

    /// `None` while generation is still running
    pub fn try_ready(&mut self) -> Option<Result<Arc<TerrainSurface>>> {
        self.poll();
        match &self.state {
            LoadState::Pending(_) => None,
            LoadState::Ready(surface) => Some(Ok(Arc::clone(surface))),
            LoadState::Failed(msg) => Some(Err(RidgewayError::Generation(msg.clone()))),
        }
    }

    /// Block until generation finishes
    pub fn wait(self) -> Result<Arc<TerrainSurface>> {
        match self.state {
            LoadState::Pending(rx) => match rx.recv() {
                Ok(result) => result.map(Arc::new),
                Err(_) => Err(RidgewayError::Generation(
                    "terrain worker exited without a result".to_string(),
                )),
            },
            LoadState::Ready(surface) => Ok(surface),
            LoadState::Failed(msg) => Err(RidgewayError::Generation(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::HeightmapGenerator;

    fn small_config() -> TerrainConfig {
        let mut config = TerrainConfig::default();
        config.segments = 24;
        config
    }

    #[test]
    fn background_result_matches_inline_generation() {
        let config = small_config();
        let loader = TerrainLoader::spawn(config.clone());
        let surface = loader.wait().unwrap();

        let inline = HeightmapGenerator::new(config).unwrap().generate().unwrap();
        assert_eq!(surface.grid().fingerprint(), inline.report.fingerprint);
    }

    #[test]
    fn polling_eventually_becomes_ready() {
        let mut loader = TerrainLoader::spawn(small_config());
        let mut result = None;
        for _ in 0..2000 {
            if let Some(r) = loader.try_ready() {
                result = Some(r);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let surface = result.unwrap().unwrap();
        assert!(loader.is_ready());
        // Later polls hand out the same surface
        let again = loader.try_ready().unwrap().unwrap();
        assert!(Arc::ptr_eq(&surface, &again));
    }

    #[test]
    fn invalid_config_surfaces_as_error() {
        let mut config = small_config();
        config.segments = 0;
        let loader = TerrainLoader::spawn(config);
        assert!(loader.wait().is_err());
    }
}
