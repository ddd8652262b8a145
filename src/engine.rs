//! Contrat du moteur web embarqué.
//!
//! Le moteur (rendu multi-processus, JavaScript, réseau) est une bibliothèque
//! native externe. Ce module décrit uniquement la surface d'API dont
//! l'adaptateur a besoin :
//!
//! - [`Engine`] : cycle de vie global (initialize, pompe de messages, shutdown)
//! - [`Browser`] : une instance de navigateur off-screen (injection d'entrées,
//!   navigation, handlers)
//! - [`Frame`] : exécution de scripts dans une frame
//!
//! Dans l'autre sens, le moteur appelle le [`ClientHandler`](crate::client::ClientHandler)
//! enregistré via [`Browser::set_client_handler`].
//!
//! Tous les types liés au moteur passent par `Rc` : ils sont `!Send`, ce qui
//! garantit à la compilation que le moteur n'est appelé que depuis le thread
//! qui l'a initialisé.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use url::Url;

use crate::client::ClientHandler;
use crate::config::EngineSettings;
use crate::error::EngineError;

/// Identifiant opaque d'un navigateur côté moteur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrowserId(pub u64);

impl fmt::Display for BrowserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "browser#{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Événements clavier / souris
// ─────────────────────────────────────────────────────────────────────────────

bitflags! {
    /// Masque de modificateurs attaché aux événements injectés.
    ///
    /// Les valeurs correspondent aux `EVENTFLAG_*` du moteur.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFlags: u32 {
        const CAPS_LOCK_ON = 1 << 0;
        const SHIFT_DOWN = 1 << 1;
        const CONTROL_DOWN = 1 << 2;
        const ALT_DOWN = 1 << 3;
    }
}

/// Type d'un événement clavier injecté.
///
/// Le moteur distingue la transition physique (`RawKeyDown` / `KeyUp`) de la
/// saisie de texte (`Char`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    RawKeyDown = 0,
    KeyDown = 1,
    KeyUp = 2,
    Char = 3,
}

/// Événement clavier tel qu'attendu par `Browser::send_key_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub native_key_code: i32,
    pub character: i32,
    pub unmodified_character: i32,
    pub modifiers: EventFlags,
}

impl KeyEvent {
    pub fn new(kind: KeyEventKind, native_key_code: i32, character: i32, modifiers: EventFlags) -> Self {
        Self {
            kind,
            native_key_code,
            character,
            unmodified_character: character,
            modifiers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Cible d'un appel `on_paint` : la vue principale ou un popup (menu
/// déroulant d'un `<select>`, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintElementType {
    View,
    Popup,
}

/// Paramètres de fenêtre passés à `create_browser`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    /// Rendu dans un buffer mémoire plutôt que dans une fenêtre native.
    pub windowless_rendering: bool,
    pub transparent_painting: bool,
}

impl WindowInfo {
    /// Mode off-screen, sans fenêtre parente.
    pub fn offscreen() -> Self {
        Self {
            windowless_rendering: true,
            transparent_painting: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bindings JavaScript → natif
// ─────────────────────────────────────────────────────────────────────────────

pub type JsFunction = Rc<dyn Fn()>;

/// Fonctions natives exposées au JavaScript de la page sous un nom global.
#[derive(Clone, Default)]
pub struct JavascriptBindings {
    bind_to_frames: bool,
    bind_to_popups: bool,
    functions: BTreeMap<String, JsFunction>,
}

impl JavascriptBindings {
    pub fn new(bind_to_frames: bool, bind_to_popups: bool) -> Self {
        Self {
            bind_to_frames,
            bind_to_popups,
            functions: BTreeMap::new(),
        }
    }

    pub fn set_function(&mut self, name: impl Into<String>, function: impl Fn() + 'static) {
        self.functions.insert(name.into(), Rc::new(function));
    }

    pub fn bind_to_frames(&self) -> bool {
        self.bind_to_frames
    }

    pub fn bind_to_popups(&self) -> bool {
        self.bind_to_popups
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn function(&self, name: &str) -> Option<JsFunction> {
        self.functions.get(name).cloned()
    }

    /// Invoque la fonction `name`. Retourne `false` si elle n'est pas liée.
    pub fn call(&self, name: &str) -> bool {
        match self.function(name) {
            Some(function) => {
                function();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for JavascriptBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JavascriptBindings")
            .field("bind_to_frames", &self.bind_to_frames)
            .field("bind_to_popups", &self.bind_to_popups)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dialogues JavaScript
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsDialogType {
    Alert,
    Confirm,
    Prompt,
}

/// Paramètres d'un `alert()` / `confirm()` / `prompt()`.
#[derive(Debug, Clone, Copy)]
pub struct JsDialogRequest<'a> {
    pub origin_url: &'a str,
    pub dialog_type: JsDialogType,
    pub message_text: &'a str,
    pub default_prompt_text: &'a str,
}

/// Réponse du handler : `suppress_message` annule le dialogue sans l'afficher,
/// `handled` indique que le handler appellera lui-même le callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsDialogResponse {
    pub suppress_message: bool,
    pub handled: bool,
}

/// Callback de continuation d'un dialogue.
pub trait JsDialogCallback {
    fn proceed(&self, allow: bool, user_input: &str);
}

// ─────────────────────────────────────────────────────────────────────────────
// Traits du binding
// ─────────────────────────────────────────────────────────────────────────────

pub trait Frame {
    fn is_main(&self) -> bool;

    fn url(&self) -> Option<Url>;

    /// `script_url` n'est utilisé que pour les messages d'erreur du moteur.
    fn execute_javascript(&self, code: &str, script_url: &str);
}

/// Une instance de navigateur off-screen.
pub trait Browser {
    fn id(&self) -> BrowserId;

    fn main_frame(&self) -> Rc<dyn Frame>;

    fn focused_frame(&self) -> Option<Rc<dyn Frame>>;

    fn send_key_event(&self, event: &KeyEvent);

    fn send_mouse_click_event(
        &self,
        x: i32,
        y: i32,
        button: MouseButton,
        mouse_up: bool,
        click_count: u32,
    );

    fn send_mouse_move_event(&self, x: i32, y: i32, mouse_leave: bool);

    fn send_focus_event(&self, focus: bool);

    /// Force le moteur à rappeler `get_view_rect` puis `on_paint`.
    fn was_resized(&self);

    fn load_url(&self, url: &Url);

    fn stop_load(&self);

    fn reload(&self);

    fn go_back(&self);

    fn go_forward(&self);

    fn set_client_handler(&self, handler: Rc<dyn ClientHandler>);

    fn set_javascript_bindings(&self, bindings: JavascriptBindings);

    fn close(&self);
}

/// Cycle de vie global du moteur.
pub trait Engine {
    fn initialize(&self, settings: &EngineSettings) -> Result<(), EngineError>;

    fn create_browser(&self, window: &WindowInfo, url: &Url) -> Result<Rc<dyn Browser>, EngineError>;

    /// Traite la file de messages interne. Non bloquant ; doit être appelé à
    /// chaque itération de la boucle hôte.
    fn message_loop_work(&self);

    fn shutdown(&self);
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_event_flags_combine() {
        let flags = EventFlags::SHIFT_DOWN | EventFlags::ALT_DOWN;
        assert!(flags.contains(EventFlags::SHIFT_DOWN));
        assert!(flags.contains(EventFlags::ALT_DOWN));
        assert!(!flags.contains(EventFlags::CONTROL_DOWN));
        assert_eq!(flags.bits(), 0b1010);
    }

    #[test]
    fn test_event_flags_debug() {
        assert_eq!(
            format!("{:?}", EventFlags::SHIFT_DOWN | EventFlags::CONTROL_DOWN),
            "EventFlags(SHIFT_DOWN | CONTROL_DOWN)"
        );
    }

    #[test]
    fn test_event_flags_bits_match_engine_values() {
        assert_eq!(EventFlags::empty().bits(), 0);
        assert_eq!(EventFlags::CAPS_LOCK_ON.bits(), 1);
        assert_eq!(EventFlags::all().bits(), 0b1111);
        assert_eq!(EventFlags::from_bits(0b0100), Some(EventFlags::CONTROL_DOWN));
        assert_eq!(EventFlags::from_bits(1 << 7), None);
    }

    #[test]
    fn test_key_event_copies_character() {
        let event = KeyEvent::new(KeyEventKind::Char, 97, 97, EventFlags::empty());
        assert_eq!(event.unmodified_character, 97);
    }

    #[test]
    fn test_bindings_call() {
        let hits = Rc::new(Cell::new(0));
        let mut bindings = JavascriptBindings::new(true, false);
        let counter = hits.clone();
        bindings.set_function("ping", move || counter.set(counter.get() + 1));

        assert!(bindings.call("ping"));
        assert!(!bindings.call("missing"));
        assert_eq!(hits.get(), 1);
        assert_eq!(bindings.names().collect::<Vec<_>>(), vec!["ping"]);
    }
}
