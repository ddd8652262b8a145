//! Callbacks moteur → embedder.
//!
//! [`ClientHandler`] est l'interface que le moteur appelle (peinture,
//! géométrie, cycle de chargement, dialogues). [`ClientSink`] l'implémente
//! pour toutes les sessions d'un même adaptateur : chaque callback retrouve
//! sa session dans le [`SessionRegistry`] à partir de l'identifiant du
//! navigateur.
//!
//! ## Politiques
//!
//! - Popups (`PaintElementType::Popup`) : non gérés, ignorés.
//! - Dialogues JS : toujours supprimés, sans modale.
//! - `beforeunload` : la navigation continue toujours.

use std::rc::Rc;

use euclid::default::Rect;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::KeyboardMode;
use crate::engine::{
    Browser, Frame, JsDialogCallback, JsDialogRequest, JsDialogResponse, PaintElementType,
};
use crate::scripts::{
    CompatScripts, ESCAPE_HOOK_SCRIPT, ESCAPE_SCRIPT_URL, FOCUS_POLLING_SCRIPT, FOCUS_SCRIPT_URL,
    SELECT_BOX_SCRIPT_URL,
};
use crate::session::{LoadState, NavigationState, SessionRegistry};
use crate::surface::BlitOutcome;

/// Interface de callbacks du moteur, une méthode par événement.
pub trait ClientHandler {
    /// Nouveau contenu pour `element`. `buffer` est en BGRA, origine en haut
    /// à gauche.
    fn on_paint(
        &self,
        browser: &dyn Browser,
        element: PaintElementType,
        dirty_rects: &[Rect<i32>],
        buffer: &[u8],
        width: u32,
        height: u32,
    ) -> bool;

    /// Zone de rendu de la vue. `None` signifie « vue pas prête » : le moteur
    /// ne peint pas.
    fn get_view_rect(&self, browser: &dyn Browser) -> Option<Rect<i32>>;

    fn on_load_start(&self, browser: &dyn Browser, frame: &dyn Frame);

    fn on_load_end(&self, browser: &dyn Browser, frame: &dyn Frame, http_status_code: i32);

    fn on_loading_state_change(
        &self,
        browser: &dyn Browser,
        is_loading: bool,
        can_go_back: bool,
        can_go_forward: bool,
    );

    fn on_javascript_dialog(
        &self,
        browser: &dyn Browser,
        request: &JsDialogRequest<'_>,
        callback: &dyn JsDialogCallback,
    ) -> JsDialogResponse;

    fn on_before_unload_dialog(
        &self,
        browser: &dyn Browser,
        message_text: &str,
        is_reload: bool,
        callback: &dyn JsDialogCallback,
    ) -> bool;
}

/// Implémentation de [`ClientHandler`] partagée par toutes les sessions.
pub struct ClientSink {
    registry: Rc<SessionRegistry>,
    scripts: CompatScripts,
}

impl ClientSink {
    pub fn new(registry: Rc<SessionRegistry>, scripts: CompatScripts) -> Self {
        Self { registry, scripts }
    }

    pub fn scripts(&self) -> &CompatScripts {
        &self.scripts
    }
}

impl ClientHandler for ClientSink {
    fn on_paint(
        &self,
        browser: &dyn Browser,
        element: PaintElementType,
        _dirty_rects: &[Rect<i32>],
        buffer: &[u8],
        width: u32,
        height: u32,
    ) -> bool {
        if element != PaintElementType::View {
            warn!(browser = %browser.id(), "Peinture de popup non gérée, ignorée");
            return true;
        }
        let Some(session) = self.registry.get(browser.id()) else {
            debug!(browser = %browser.id(), "on_paint sans session");
            return true;
        };
        match session.blit(buffer, width, height) {
            BlitOutcome::Copied => trace!(browser = %browser.id(), width, height, "Frame copiée"),
            BlitOutcome::Stale => {
                debug!(browser = %browser.id(), width, height, "Frame périmée ignorée")
            }
            BlitOutcome::Truncated => warn!(
                browser = %browser.id(),
                width,
                height,
                len = buffer.len(),
                "Buffer de peinture tronqué, ignoré"
            ),
        }
        true
    }

    fn get_view_rect(&self, browser: &dyn Browser) -> Option<Rect<i32>> {
        let rect = self.registry.get(browser.id())?.view_rect();
        trace!(browser = %browser.id(), ?rect, "get_view_rect");
        rect
    }

    fn on_load_start(&self, browser: &dyn Browser, frame: &dyn Frame) {
        let Some(session) = self.registry.get(browser.id()) else {
            return;
        };
        if frame.is_main() {
            session.set_load_state(LoadState::Loading);
        }

        match self.scripts.select_box() {
            Some(code) => frame.execute_javascript(code, SELECT_BOX_SCRIPT_URL),
            None => trace!(browser = %browser.id(), "Correctif select-box indisponible"),
        }

        match session.keyboard_mode() {
            KeyboardMode::Local => {
                debug!(browser = %browser.id(), "Injection du suivi de focus des champs texte");
                frame.execute_javascript(FOCUS_POLLING_SCRIPT, FOCUS_SCRIPT_URL);
            }
            KeyboardMode::Global => frame.execute_javascript(ESCAPE_HOOK_SCRIPT, ESCAPE_SCRIPT_URL),
        }
    }

    fn on_load_end(&self, browser: &dyn Browser, frame: &dyn Frame, http_status_code: i32) {
        let Some(session) = self.registry.get(browser.id()) else {
            return;
        };
        if frame.is_main() {
            session.set_load_state(LoadState::Loaded);
            let url = frame.url();
            info!(
                browser = %browser.id(),
                status = http_status_code,
                url = url.as_ref().map(Url::as_str).unwrap_or_default(),
                "Page chargée"
            );
        }
        // Le moteur perd le focus après une navigation ; en mode local c'est
        // request_keyboard() qui le rétablit.
        if session.keyboard_mode() == KeyboardMode::Global {
            browser.send_focus_event(true);
        }
    }

    fn on_loading_state_change(
        &self,
        browser: &dyn Browser,
        is_loading: bool,
        can_go_back: bool,
        can_go_forward: bool,
    ) {
        debug!(browser = %browser.id(), is_loading, can_go_back, can_go_forward, "on_loading_state_change");
        if let Some(session) = self.registry.get(browser.id()) {
            session.set_navigation(NavigationState {
                is_loading,
                can_go_back,
                can_go_forward,
            });
        }
    }

    fn on_javascript_dialog(
        &self,
        browser: &dyn Browser,
        request: &JsDialogRequest<'_>,
        _callback: &dyn JsDialogCallback,
    ) -> JsDialogResponse {
        debug!(
            browser = %browser.id(),
            origin = request.origin_url,
            kind = ?request.dialog_type,
            "Dialogue JavaScript supprimé"
        );
        JsDialogResponse {
            suppress_message: true,
            handled: false,
        }
    }

    fn on_before_unload_dialog(
        &self,
        browser: &dyn Browser,
        _message_text: &str,
        is_reload: bool,
        callback: &dyn JsDialogCallback,
    ) -> bool {
        debug!(browser = %browser.id(), is_reload, "beforeunload : navigation autorisée");
        callback.proceed(true, "");
        true
    }
}
