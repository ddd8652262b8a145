//! Session navigateur : l'état d'un widget une fois le moteur démarré.
//!
//! Une session par widget. Elle regroupe le handle moteur, la surface de
//! rendu, le dispatcher d'entrées (avec l'état des modificateurs) et le grant
//! clavier éventuel. Tous les champs sont en mutabilité intérieure (`Cell` /
//! `RefCell`) car la session est partagée, via `Rc`, entre le widget, le
//! registre consulté par le [`ClientSink`](crate::client::ClientSink) et les
//! bindings JavaScript.
//!
//! Règle : aucun emprunt n'est conservé pendant un appel au moteur, qui peut
//! rappeler l'adaptateur de façon synchrone.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use euclid::default::{Rect, Size2D};
use tracing::{debug, trace, warn};

use crate::config::KeyboardMode;
use crate::engine::{Browser, BrowserId, JavascriptBindings};
use crate::error::SurfaceError;
use crate::input::{EngineCall, InputDispatcher, Touch, WidgetBounds};
use crate::keyboard::{KeyboardGrant, KeyboardRouter};
use crate::keyutils::ToolkitKey;
use crate::modifiers::KeyModifiers;
use crate::scripts::{self, ESCAPE_HOOK_CALL, ESCAPE_SCRIPT_URL};
use crate::surface::{BlitOutcome, RenderSurface};

/// Axe de chargement de la page principale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
}

/// Dernier état rapporté par `on_loading_state_change`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub is_loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

pub struct Session {
    browser: Rc<dyn Browser>,
    keyboard_mode: KeyboardMode,
    keyboard: Rc<KeyboardRouter>,
    bounds: Cell<WidgetBounds>,
    surface: RefCell<RenderSurface>,
    input: RefCell<InputDispatcher>,
    grant: Cell<Option<KeyboardGrant>>,
    load_state: Cell<LoadState>,
    navigation: Cell<NavigationState>,
}

impl Session {
    pub fn new(
        browser: Rc<dyn Browser>,
        surface: RenderSurface,
        bounds: WidgetBounds,
        keyboard_mode: KeyboardMode,
        keyboard: Rc<KeyboardRouter>,
    ) -> Self {
        Self {
            browser,
            keyboard_mode,
            keyboard,
            bounds: Cell::new(bounds),
            surface: RefCell::new(surface),
            input: RefCell::new(InputDispatcher::new()),
            grant: Cell::new(None),
            load_state: Cell::new(LoadState::Idle),
            navigation: Cell::new(NavigationState::default()),
        }
    }

    pub fn id(&self) -> BrowserId {
        self.browser.id()
    }

    pub fn browser(&self) -> &Rc<dyn Browser> {
        &self.browser
    }

    pub fn keyboard_mode(&self) -> KeyboardMode {
        self.keyboard_mode
    }

    pub fn bounds(&self) -> WidgetBounds {
        self.bounds.get()
    }

    pub fn surface(&self) -> Ref<'_, RenderSurface> {
        self.surface.borrow()
    }

    pub fn take_surface_dirty(&self) -> bool {
        self.surface.borrow_mut().take_dirty()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state.get()
    }

    pub fn set_load_state(&self, state: LoadState) {
        let previous = self.load_state.replace(state);
        if previous != state {
            debug!(browser = %self.id(), ?previous, ?state, "Changement d'état de chargement");
        }
    }

    pub fn navigation(&self) -> NavigationState {
        self.navigation.get()
    }

    pub fn set_navigation(&self, navigation: NavigationState) {
        self.navigation.set(navigation);
    }

    // ── Surface ───────────────────────────────────────────────────────

    /// Nouvelle taille du widget : recrée la surface puis prévient le moteur.
    ///
    /// Si la surface ne peut pas être recréée, l'ancienne est conservée avec
    /// la zone qui lui correspond.
    pub fn resize(&self, bounds: WidgetBounds) -> Result<(), SurfaceError> {
        let result = self.surface.borrow_mut().recreate(surface_size(&bounds));
        match result {
            Ok(()) => self.bounds.set(bounds),
            Err(ref error) => {
                warn!(browser = %self.id(), %error, "Surface non recréée, taille précédente conservée")
            }
        }
        self.browser.was_resized();
        result
    }

    pub fn blit(&self, buffer: &[u8], width: u32, height: u32) -> BlitOutcome {
        self.surface.borrow_mut().blit(buffer, width, height)
    }

    /// `None` tant que la surface est vide : le moteur ne peint pas.
    pub fn view_rect(&self) -> Option<Rect<i32>> {
        let surface = self.surface.borrow();
        if surface.is_empty() {
            None
        } else {
            Some(surface.view_rect())
        }
    }

    // ── Clavier ───────────────────────────────────────────────────────

    /// Prend le clavier toolkit. Sans effet si la session le détient déjà.
    pub fn request_keyboard(&self) {
        if self.has_keyboard() {
            trace!(browser = %self.id(), "Clavier déjà détenu");
            return;
        }
        debug!(browser = %self.id(), "request_keyboard()");
        let grant = self.keyboard.request(self.id());
        self.grant.set(Some(grant));
        self.input.borrow_mut().reset_modifiers();
        self.browser.send_focus_event(true);
    }

    /// Rend le clavier. Les modificateurs sont toujours remis à zéro, même
    /// si aucun grant n'est détenu.
    pub fn release_keyboard(&self) {
        self.input.borrow_mut().reset_modifiers();
        let Some(grant) = self.grant.take() else {
            return;
        };
        debug!(browser = %self.id(), "release_keyboard()");
        self.keyboard.release(grant);
    }

    pub fn has_keyboard(&self) -> bool {
        self.grant
            .get()
            .is_some_and(|grant| self.keyboard.is_current(grant))
    }

    /// Bindings `request/release_keyboard` exposés au JavaScript de la page.
    ///
    /// Les closures ne gardent qu'une référence faible : une session détruite
    /// rend les appels JS inertes.
    pub fn keyboard_bindings(self: &Rc<Self>) -> JavascriptBindings {
        let mut bindings = JavascriptBindings::new(true, true);

        let session = Rc::downgrade(self);
        bindings.set_function(scripts::REQUEST_KEYBOARD_BINDING, move || {
            if let Some(session) = session.upgrade() {
                session.request_keyboard();
            }
        });

        let session = Rc::downgrade(self);
        bindings.set_function(scripts::RELEASE_KEYBOARD_BINDING, move || {
            if let Some(session) = session.upgrade() {
                session.release_keyboard();
            }
        });

        bindings
    }

    pub fn key_down(&self, key: ToolkitKey, modifiers: KeyModifiers) {
        if !self.has_keyboard() {
            return;
        }
        trace!(browser = %self.id(), ?key, ?modifiers, "key_down");
        let call = self.input.borrow_mut().key_down(key, modifiers);
        self.perform(call);
    }

    pub fn key_up(&self, key: ToolkitKey) {
        if !self.has_keyboard() {
            return;
        }
        trace!(browser = %self.id(), ?key, "key_up");
        let calls = self.input.borrow_mut().key_up(key);
        for call in calls {
            self.perform(call);
        }
    }

    // ── Pointeur ──────────────────────────────────────────────────────

    /// Retourne `true` si le toucher est dans le widget (et donc capturé).
    pub fn touch_down(&self, touch: &Touch) -> bool {
        let call = self.input.borrow_mut().touch_down(touch, &self.bounds.get());
        self.perform_optional(call)
    }

    pub fn touch_move(&self, touch: &Touch) -> bool {
        let call = self.input.borrow_mut().touch_move(touch, &self.bounds.get());
        self.perform_optional(call)
    }

    pub fn touch_up(&self, touch: &Touch) -> bool {
        let call = self.input.borrow_mut().touch_up(touch, &self.bounds.get());
        self.perform_optional(call)
    }

    fn perform_optional(&self, call: Option<EngineCall>) -> bool {
        match call {
            Some(call) => {
                self.perform(call);
                true
            }
            None => false,
        }
    }

    fn perform(&self, call: EngineCall) {
        match call {
            EngineCall::Key(event) => self.browser.send_key_event(&event),
            EngineCall::MouseClick {
                x,
                y,
                button,
                mouse_up,
                click_count,
            } => self
                .browser
                .send_mouse_click_event(x, y, button, mouse_up, click_count),
            EngineCall::MouseMove { x, y, mouse_leave } => {
                self.browser.send_mouse_move_event(x, y, mouse_leave)
            }
            EngineCall::EscapeHook => {
                debug!(browser = %self.id(), "Échap : hook JavaScript");
                let frame = self
                    .browser
                    .focused_frame()
                    .unwrap_or_else(|| self.browser.main_frame());
                frame.execute_javascript(ESCAPE_HOOK_CALL, ESCAPE_SCRIPT_URL);
            }
        }
    }
}

/// Taille de surface (pixels entiers) pour une zone de widget.
pub fn surface_size(bounds: &WidgetBounds) -> Size2D<u32> {
    Size2D::new(
        bounds.size.width.max(0.0).round() as u32,
        bounds.size.height.max(0.0).round() as u32,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Registre : handle moteur → session
// ─────────────────────────────────────────────────────────────────────────────

/// Sessions actives, indexées par l'identifiant du navigateur.
///
/// Le moteur ne passe que le handle du navigateur à ses callbacks ; le
/// registre permet au sink de retrouver la session correspondante.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RefCell<HashMap<BrowserId, Rc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Rc<Session>) {
        let id = session.id();
        if self.sessions.borrow_mut().insert(id, session).is_some() {
            warn!(browser = %id, "Session remplacée dans le registre");
        }
    }

    pub fn remove(&self, id: BrowserId) -> Option<Rc<Session>> {
        self.sessions.borrow_mut().remove(&id)
    }

    pub fn get(&self, id: BrowserId) -> Option<Rc<Session>> {
        self.sessions.borrow().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use euclid::default::Point2D;

    use super::*;

    #[test]
    fn test_surface_size_rounds() {
        let bounds = Rect::new(Point2D::new(3.0, 4.0), Size2D::new(799.6, 600.2));
        assert_eq!(surface_size(&bounds), Size2D::new(800, 600));
    }

    #[test]
    fn test_surface_size_negative_is_zero() {
        let bounds = Rect::new(Point2D::origin(), Size2D::new(-5.0, 10.0));
        assert_eq!(surface_size(&bounds), Size2D::new(0, 10));
    }
}
