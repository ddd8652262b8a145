//! Traduction des entrées toolkit en appels moteur.
//!
//! Le dispatcher est une machine à états pure : chaque méthode retourne les
//! [`EngineCall`] à effectuer, sans toucher au moteur. La session les exécute
//! une fois ses emprunts relâchés, ce qui permet au moteur de rappeler
//! l'adaptateur pendant l'injection sans conflit de `RefCell`.
//!
//! ## Pointeur
//!
//! ```text
//! idle ──touch_down (dans le widget)──▶ grabbed ──touch_up──▶ idle
//!                                        │  ▲
//!                                        └──┘ touch_move
//! ```
//!
//! L'origine du toolkit est en bas à gauche, celle du moteur en haut à
//! gauche : `y_moteur = hauteur - y_local`.
//!
//! ## Clavier
//!
//! Un `key_down` produit `RAWKEYDOWN` ; le `key_up` correspondant produit
//! `CHAR` puis `KEYUP`, avec le même couple de codes et le même masque.
//! Échap n'est pas transmis : il déclenche le hook JavaScript d'échappement.

use euclid::default::{Point2D, Rect};

use crate::engine::{EventFlags, KeyEvent, KeyEventKind, MouseButton};
use crate::keyutils::{self, ENGINE_ESCAPE_CODE, ToolkitKey};
use crate::modifiers::{KeyModifiers, ModifierState};

/// Zone du widget en coordonnées toolkit (origine en bas à gauche).
pub type WidgetBounds = Rect<f64>;

pub type TouchId = u64;

/// Identifiant du geste souris (un seul pointeur).
pub const MOUSE_TOUCH_ID: TouchId = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: TouchId,
    /// Position en coordonnées toolkit.
    pub pos: Point2D<f64>,
}

impl Touch {
    pub fn new(id: TouchId, x: f64, y: f64) -> Self {
        Self {
            id,
            pos: Point2D::new(x, y),
        }
    }
}

/// Appel à effectuer sur le navigateur.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Key(KeyEvent),
    MouseClick {
        x: i32,
        y: i32,
        button: MouseButton,
        mouse_up: bool,
        click_count: u32,
    },
    MouseMove {
        x: i32,
        y: i32,
        mouse_leave: bool,
    },
    /// Exécuter le hook d'échappement dans la frame focalisée.
    EscapeHook,
}

#[derive(Debug, Default)]
pub struct InputDispatcher {
    grabs: Vec<TouchId>,
    modifiers: ModifierState,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_down(&mut self, touch: &Touch, bounds: &WidgetBounds) -> Option<EngineCall> {
        if !bounds.contains(touch.pos) {
            return None;
        }
        if !self.grabs.contains(&touch.id) {
            self.grabs.push(touch.id);
        }
        let (x, y) = engine_point(touch.pos, bounds);
        Some(EngineCall::MouseClick {
            x,
            y,
            button: MouseButton::Left,
            mouse_up: false,
            click_count: 1,
        })
    }

    pub fn touch_move(&mut self, touch: &Touch, bounds: &WidgetBounds) -> Option<EngineCall> {
        if !self.is_grabbed(touch.id) {
            return None;
        }
        let (x, y) = engine_point(touch.pos, bounds);
        Some(EngineCall::MouseMove {
            x,
            y,
            mouse_leave: false,
        })
    }

    pub fn touch_up(&mut self, touch: &Touch, bounds: &WidgetBounds) -> Option<EngineCall> {
        let index = self.grabs.iter().position(|id| *id == touch.id)?;
        self.grabs.swap_remove(index);
        let (x, y) = engine_point(touch.pos, bounds);
        Some(EngineCall::MouseClick {
            x,
            y,
            button: MouseButton::Left,
            mouse_up: true,
            click_count: 1,
        })
    }

    pub fn is_grabbed(&self, id: TouchId) -> bool {
        self.grabs.contains(&id)
    }

    pub fn key_down(&mut self, key: ToolkitKey, modifiers: KeyModifiers) -> EngineCall {
        let flags = modifiers.event_flags();
        let (native, character) = keyutils::engine_key_codes(key);

        if native == ENGINE_ESCAPE_CODE {
            return EngineCall::EscapeHook;
        }

        let event = KeyEvent::new(KeyEventKind::RawKeyDown, native, character, flags);
        self.modifiers.press(key);
        EngineCall::Key(event)
    }

    pub fn key_up(&mut self, key: ToolkitKey) -> [EngineCall; 2] {
        let flags = self.modifiers.event_flags();
        let (native, character) = keyutils::engine_key_codes(key);

        let char_event = KeyEvent::new(KeyEventKind::Char, native, character, flags);
        let up_event = KeyEvent::new(KeyEventKind::KeyUp, native, character, flags);
        self.modifiers.release(key);
        [EngineCall::Key(char_event), EngineCall::Key(up_event)]
    }

    pub fn reset_modifiers(&mut self) {
        self.modifiers.reset();
    }

    pub fn modifiers(&self) -> &ModifierState {
        &self.modifiers
    }

    pub fn modifier_flags(&self) -> EventFlags {
        self.modifiers.event_flags()
    }
}

/// Point toolkit → point moteur, relatif au widget, axe Y inversé.
fn engine_point(pos: Point2D<f64>, bounds: &WidgetBounds) -> (i32, i32) {
    let local_x = pos.x - bounds.origin.x;
    let local_y = pos.y - bounds.origin.y;
    (local_x as i32, (bounds.size.height - local_y) as i32)
}
