//! Widget navigateur et adaptateur qui le relie au moteur.
//!
//! ## Cycle de vie
//!
//! ```text
//! BrowserWidget::new ─▶ Uninitialized ──resize (taille non nulle)──▶ Active(Session)
//!                            │                                       │
//!                            └──── échec surface / moteur ──▶ Failed  │
//!                                                                    ▼
//!                                               teardown() / Drop ─▶ Closed
//! ```
//!
//! Le démarrage du moteur est différé jusqu'au premier redimensionnement
//! avec une vraie taille : une surface de taille nulle ferait refuser au
//! moteur toute peinture.
//!
//! ## Adapter
//!
//! [`Adapter`] regroupe ce qui est partagé entre widgets d'un même hôte :
//! le runtime moteur, le registre de sessions, le sink de callbacks et le
//! routeur clavier.

use std::cell::Ref;
use std::rc::Rc;

use tracing::{debug, error, info};
use url::Url;

use crate::client::{ClientHandler, ClientSink};
use crate::config::{Config, EngineSettings, KeyboardMode};
use crate::engine::{Engine, WindowInfo};
use crate::error::WidgetError;
use crate::input::{Touch, WidgetBounds};
use crate::keyboard::KeyboardRouter;
use crate::keyutils::ToolkitKey;
use crate::modifiers::KeyModifiers;
use crate::runtime::EngineRuntime;
use crate::scripts::{self, CompatScripts, NAVIGATE_SCRIPT_URL};
use crate::session::{NavigationState, Session, SessionRegistry, surface_size};
use crate::surface::RenderSurface;

// ─────────────────────────────────────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────────────────────────────────────

pub struct Adapter {
    runtime: EngineRuntime,
    registry: Rc<SessionRegistry>,
    sink: Rc<ClientSink>,
    keyboard: Rc<KeyboardRouter>,
}

impl Adapter {
    pub fn new(engine: Rc<dyn Engine>, settings: EngineSettings, scripts: CompatScripts) -> Rc<Self> {
        let registry = Rc::new(SessionRegistry::new());
        Rc::new(Self {
            runtime: EngineRuntime::new(engine, settings),
            sink: Rc::new(ClientSink::new(registry.clone(), scripts)),
            registry,
            keyboard: Rc::new(KeyboardRouter::new()),
        })
    }

    /// Construit l'adaptateur depuis la configuration, polyfill compris.
    pub fn from_config(engine: Rc<dyn Engine>, config: &Config) -> Rc<Self> {
        let scripts = CompatScripts::load(config.compat.select_box_dir().as_deref());
        Self::new(engine, config.engine.clone(), scripts)
    }

    pub fn create_widget(self: &Rc<Self>, options: WidgetOptions) -> BrowserWidget {
        BrowserWidget::new(self.clone(), options)
    }

    /// À appeler à chaque itération de la boucle hôte.
    pub fn pump(&self) {
        self.runtime.pump();
    }

    pub fn shutdown(&self) {
        self.runtime.shutdown();
    }

    pub fn runtime(&self) -> &EngineRuntime {
        &self.runtime
    }

    pub fn registry(&self) -> &Rc<SessionRegistry> {
        &self.registry
    }

    pub fn keyboard(&self) -> &Rc<KeyboardRouter> {
        &self.keyboard
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BrowserWidget
// ─────────────────────────────────────────────────────────────────────────────

/// Réglages propres à une instance de widget.
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    pub start_url: Url,
    pub keyboard_mode: KeyboardMode,
}

impl WidgetOptions {
    pub fn new(start_url: Url) -> Self {
        Self {
            start_url,
            keyboard_mode: KeyboardMode::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, url::ParseError> {
        Ok(Self {
            start_url: config.general.start_url()?,
            keyboard_mode: config.widget.keyboard_mode,
        })
    }
}

pub enum WidgetState {
    Uninitialized,
    Active(Rc<Session>),
    /// Le démarrage a échoué ; pas de nouvelle tentative.
    Failed,
    Closed,
}

pub struct BrowserWidget {
    adapter: Rc<Adapter>,
    options: WidgetOptions,
    state: WidgetState,
}

impl BrowserWidget {
    pub fn new(adapter: Rc<Adapter>, options: WidgetOptions) -> Self {
        Self {
            adapter,
            options,
            state: WidgetState::Uninitialized,
        }
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn session(&self) -> Option<&Rc<Session>> {
        match self.state {
            WidgetState::Active(ref session) => Some(session),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session().is_some()
    }

    /// Nouvelle zone du widget.
    ///
    /// Avant le démarrage, une taille non nulle démarre la session. Ensuite
    /// la surface est recréée et le moteur prévenu. Seul un échec de
    /// démarrage est retourné comme erreur.
    pub fn resize(&mut self, bounds: WidgetBounds) -> Result<(), WidgetError> {
        match self.state {
            WidgetState::Uninitialized => {
                let size = surface_size(&bounds);
                if size.width == 0 || size.height == 0 {
                    debug!(?size, "Taille nulle, démarrage différé");
                    return Ok(());
                }
                match self.start_session(bounds) {
                    Ok(session) => {
                        self.state = WidgetState::Active(session);
                        Ok(())
                    }
                    Err(error) => {
                        error!(%error, "Démarrage de la session impossible");
                        self.state = WidgetState::Failed;
                        Err(error)
                    }
                }
            }
            WidgetState::Active(ref session) => {
                // Une surface non recréée garde l'ancienne taille : déjà
                // journalisé par la session, la session reste utilisable.
                let _ = session.resize(bounds);
                Ok(())
            }
            WidgetState::Failed | WidgetState::Closed => Ok(()),
        }
    }

    fn start_session(&self, bounds: WidgetBounds) -> Result<Rc<Session>, WidgetError> {
        self.adapter.runtime.ensure_initialized()?;

        let surface = RenderSurface::new(surface_size(&bounds))?;
        let browser = self
            .adapter
            .runtime
            .create_browser(&WindowInfo::offscreen(), &self.options.start_url)?;
        browser.send_focus_event(true);

        let session = Rc::new(Session::new(
            browser.clone(),
            surface,
            bounds,
            self.options.keyboard_mode,
            self.adapter.keyboard.clone(),
        ));
        // Enregistrée avant tout callback : was_resized() rappelle get_view_rect.
        self.adapter.registry.insert(session.clone());

        browser.set_client_handler(self.adapter.sink.clone() as Rc<dyn ClientHandler>);
        browser.set_javascript_bindings(session.keyboard_bindings());
        browser.was_resized();

        if self.options.keyboard_mode == KeyboardMode::Global {
            session.request_keyboard();
        }

        info!(
            browser = %session.id(),
            url = %self.options.start_url,
            width = bounds.size.width,
            height = bounds.size.height,
            mode = ?self.options.keyboard_mode,
            "Session navigateur démarrée"
        );
        Ok(session)
    }

    /// Appelé à chaque frame par l'hôte.
    pub fn tick(&self) {
        self.adapter.pump();
    }

    // ── Entrées ───────────────────────────────────────────────────────

    pub fn on_touch_down(&self, touch: &Touch) -> bool {
        self.session().is_some_and(|session| session.touch_down(touch))
    }

    pub fn on_touch_move(&self, touch: &Touch) -> bool {
        self.session().is_some_and(|session| session.touch_move(touch))
    }

    pub fn on_touch_up(&self, touch: &Touch) -> bool {
        self.session().is_some_and(|session| session.touch_up(touch))
    }

    pub fn on_key_down(&self, key: ToolkitKey, modifiers: KeyModifiers) {
        if let Some(session) = self.session() {
            session.key_down(key, modifiers);
        }
    }

    pub fn on_key_up(&self, key: ToolkitKey) {
        if let Some(session) = self.session() {
            session.key_up(key);
        }
    }

    pub fn request_keyboard(&self) {
        if let Some(session) = self.session() {
            session.request_keyboard();
        }
    }

    pub fn release_keyboard(&self) {
        if let Some(session) = self.session() {
            session.release_keyboard();
        }
    }

    // ── Navigation ────────────────────────────────────────────────────

    pub fn go_back(&self) {
        if let Some(session) = self.session() {
            debug!(browser = %session.id(), "go back");
            session.browser().go_back();
        }
    }

    pub fn go_forward(&self) {
        if let Some(session) = self.session() {
            debug!(browser = %session.id(), "go forward");
            session.browser().go_forward();
        }
    }

    pub fn reload(&self) {
        if let Some(session) = self.session() {
            session.browser().reload();
        }
    }

    pub fn stop_load(&self) {
        if let Some(session) = self.session() {
            session.browser().stop_load();
        }
    }

    /// Navigue vers `url` par une redirection JavaScript dans la frame
    /// principale, après avoir stoppé le chargement en cours.
    pub fn navigate(&self, url: &Url) {
        if let Some(session) = self.session() {
            debug!(browser = %session.id(), %url, "navigate");
            let browser = session.browser();
            browser.stop_load();
            browser
                .main_frame()
                .execute_javascript(&scripts::redirect_script(url), NAVIGATE_SCRIPT_URL);
        }
    }

    pub fn navigation(&self) -> NavigationState {
        self.session()
            .map(|session| session.navigation())
            .unwrap_or_default()
    }

    // ── Compositeur ───────────────────────────────────────────────────

    pub fn surface(&self) -> Option<Ref<'_, RenderSurface>> {
        self.session().map(|session| session.surface())
    }

    /// Consomme le signal « surface modifiée ».
    pub fn take_surface_dirty(&self) -> bool {
        self.session().is_some_and(|session| session.take_surface_dirty())
    }

    // ── Destruction ───────────────────────────────────────────────────

    /// Rend le clavier, retire la session du registre puis ferme le navigateur.
    pub fn teardown(&mut self) {
        let WidgetState::Active(session) = std::mem::replace(&mut self.state, WidgetState::Closed)
        else {
            return;
        };
        session.release_keyboard();
        self.adapter.registry.remove(session.id());
        session.browser().close();
        info!(browser = %session.id(), "Session navigateur fermée");
    }
}

impl Drop for BrowserWidget {
    fn drop(&mut self) {
        self.teardown();
    }
}
