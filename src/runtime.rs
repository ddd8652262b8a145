//! Propriété du moteur côté hôte.
//!
//! Le moteur est initialisé une seule fois par processus, au démarrage de la
//! première session, puis pompé à chaque itération de la boucle hôte. Sans
//! `pump()`, le moteur ne traite plus ses messages : plus de peinture, plus
//! d'entrées.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info};
use url::Url;

use crate::config::EngineSettings;
use crate::engine::{Browser, Engine, WindowInfo};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Uninitialized,
    Running,
    ShutDown,
}

pub struct EngineRuntime {
    engine: Rc<dyn Engine>,
    settings: EngineSettings,
    state: Cell<RuntimeState>,
}

impl EngineRuntime {
    pub fn new(engine: Rc<dyn Engine>, settings: EngineSettings) -> Self {
        Self {
            engine,
            settings,
            state: Cell::new(RuntimeState::Uninitialized),
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.state.get()
    }

    pub fn ensure_initialized(&self) -> Result<(), EngineError> {
        match self.state.get() {
            RuntimeState::Running => Ok(()),
            RuntimeState::ShutDown => Err(EngineError::ShutDown),
            RuntimeState::Uninitialized => {
                self.engine.initialize(&self.settings)?;
                self.state.set(RuntimeState::Running);
                info!(
                    windowless = self.settings.windowless_rendering,
                    severity = ?self.settings.log_severity,
                    "Moteur initialisé"
                );
                Ok(())
            }
        }
    }

    pub fn create_browser(&self, window: &WindowInfo, url: &Url) -> Result<Rc<dyn Browser>, EngineError> {
        if self.state.get() != RuntimeState::Running {
            return Err(EngineError::NotInitialized);
        }
        let browser = self.engine.create_browser(window, url)?;
        debug!(browser = %browser.id(), %url, "Navigateur créé");
        Ok(browser)
    }

    /// Une itération de la file de messages du moteur. Sans effet tant que le
    /// moteur n'est pas initialisé.
    pub fn pump(&self) {
        if self.state.get() == RuntimeState::Running {
            self.engine.message_loop_work();
        }
    }

    /// Arrête le moteur. Idempotent.
    pub fn shutdown(&self) {
        match self.state.replace(RuntimeState::ShutDown) {
            RuntimeState::Running => {
                self.engine.shutdown();
                info!("Moteur arrêté");
            }
            RuntimeState::Uninitialized => debug!("Arrêt d'un moteur jamais initialisé"),
            RuntimeState::ShutDown => debug!("Moteur déjà arrêté"),
        }
    }
}
