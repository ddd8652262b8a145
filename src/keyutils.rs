//! Codes de touches : Winit → toolkit → moteur.
//!
//! Le widget travaille avec des codes toolkit numériques (espace de keysyms
//! SDL : ASCII pour les touches imprimables, 273–276 pour les flèches,
//! 303–313 pour les modificateurs…). Ce module fournit :
//!
//! - [`toolkit_key_from_winit`] : conversion d'une touche Winit vers ce code
//! - [`engine_key_codes`] : le couple `(native_key_code, character)` envoyé
//!   au moteur
//!
//! La table toolkit → moteur est volontairement minimale : le code toolkit
//! est transmis tel quel, seuls les modificateurs ont un caractère nul. Une
//! traduction dépendante de la disposition clavier n'est pas implémentée.

use winit::keyboard::{Key as WinitKey, KeyCode, NamedKey as WinitNamedKey, PhysicalKey};

/// Code de touche côté toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolkitKey(pub u32);

impl ToolkitKey {
    pub const BACKSPACE: Self = Self(8);
    pub const TAB: Self = Self(9);
    pub const ENTER: Self = Self(13);
    pub const PAUSE: Self = Self(19);
    pub const ESCAPE: Self = Self(27);
    pub const SPACE: Self = Self(32);
    pub const DELETE: Self = Self(127);

    pub const NUMPAD_0: Self = Self(256);
    pub const NUMPAD_DECIMAL: Self = Self(266);
    pub const NUMPAD_DIVIDE: Self = Self(267);
    pub const NUMPAD_MULTIPLY: Self = Self(268);
    pub const NUMPAD_SUBTRACT: Self = Self(269);
    pub const NUMPAD_ADD: Self = Self(270);
    pub const NUMPAD_ENTER: Self = Self(271);
    pub const NUMPAD_EQUAL: Self = Self(272);

    pub const ARROW_UP: Self = Self(273);
    pub const ARROW_DOWN: Self = Self(274);
    pub const ARROW_RIGHT: Self = Self(275);
    pub const ARROW_LEFT: Self = Self(276);
    pub const INSERT: Self = Self(277);
    pub const HOME: Self = Self(278);
    pub const END: Self = Self(279);
    pub const PAGE_UP: Self = Self(280);
    pub const PAGE_DOWN: Self = Self(281);

    /// F1 ; F2..F15 suivent.
    pub const F1: Self = Self(282);

    pub const NUM_LOCK: Self = Self(300);
    pub const CAPS_LOCK: Self = Self(301);
    pub const SCROLL_LOCK: Self = Self(302);
    pub const SHIFT_RIGHT: Self = Self(303);
    pub const SHIFT_LEFT: Self = Self(304);
    pub const CONTROL_RIGHT: Self = Self(305);
    pub const CONTROL_LEFT: Self = Self(306);
    pub const ALT_LEFT: Self = Self(308);
    pub const SUPER_LEFT: Self = Self(311);
    pub const SUPER_RIGHT: Self = Self(312);
    /// Alt droit (AltGr).
    pub const ALT_RIGHT: Self = Self(313);
    pub const PRINT_SCREEN: Self = Self(316);
    pub const MENU: Self = Self(319);

    /// Shift, Ctrl ou Alt (gauche ou droit).
    pub const fn is_modifier(self) -> bool {
        matches!(self.0, 303 | 304 | 305 | 306 | 308 | 313)
    }
}

/// Code natif du moteur correspondant à Échap.
pub const ENGINE_ESCAPE_CODE: i32 = 27;

/// Traduit un code toolkit en `(native_key_code, character)` pour le moteur.
pub fn engine_key_codes(key: ToolkitKey) -> (i32, i32) {
    let code = key.0 as i32;
    if key.is_modifier() {
        return (code, 0);
    }
    (code, code)
}

// ─────────────────────────────────────────────────────────────────────────────
// Winit → toolkit
// ─────────────────────────────────────────────────────────────────────────────

/// Convertit une touche Winit en code toolkit.
///
/// Les touches non imprimables sont identifiées par leur code physique ; les
/// caractères par la touche logique (en minuscule, comme un keysym). Retourne
/// `None` pour les touches sans équivalent (touches mortes, IME).
pub fn toolkit_key_from_winit(logical_key: &WinitKey, physical_key: &PhysicalKey) -> Option<ToolkitKey> {
    if let PhysicalKey::Code(code) = physical_key
        && let Some(key) = code_from_winit(*code)
    {
        return Some(key);
    }
    key_from_winit(logical_key)
}

fn key_from_winit(logical_key: &WinitKey) -> Option<ToolkitKey> {
    match logical_key {
        WinitKey::Character(string) => {
            let mut chars = string.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            let ch = ch.to_lowercase().next().unwrap_or(ch);
            Some(ToolkitKey(ch as u32))
        }
        WinitKey::Named(named) => named_from_winit(*named),
        WinitKey::Unidentified(_) | WinitKey::Dead(_) => None,
    }
}

fn named_from_winit(named: WinitNamedKey) -> Option<ToolkitKey> {
    let key = match named {
        WinitNamedKey::Backspace => ToolkitKey::BACKSPACE,
        WinitNamedKey::Tab => ToolkitKey::TAB,
        WinitNamedKey::Enter => ToolkitKey::ENTER,
        WinitNamedKey::Escape => ToolkitKey::ESCAPE,
        WinitNamedKey::Space => ToolkitKey::SPACE,
        WinitNamedKey::Delete => ToolkitKey::DELETE,
        WinitNamedKey::ArrowUp => ToolkitKey::ARROW_UP,
        WinitNamedKey::ArrowDown => ToolkitKey::ARROW_DOWN,
        WinitNamedKey::ArrowLeft => ToolkitKey::ARROW_LEFT,
        WinitNamedKey::ArrowRight => ToolkitKey::ARROW_RIGHT,
        WinitNamedKey::Home => ToolkitKey::HOME,
        WinitNamedKey::End => ToolkitKey::END,
        WinitNamedKey::PageUp => ToolkitKey::PAGE_UP,
        WinitNamedKey::PageDown => ToolkitKey::PAGE_DOWN,
        WinitNamedKey::Insert => ToolkitKey::INSERT,
        WinitNamedKey::AltGraph => ToolkitKey::ALT_RIGHT,
        _ => return None,
    };
    Some(key)
}

fn code_from_winit(code: KeyCode) -> Option<ToolkitKey> {
    let key = match code {
        KeyCode::Backspace => ToolkitKey::BACKSPACE,
        KeyCode::Tab => ToolkitKey::TAB,
        KeyCode::Enter => ToolkitKey::ENTER,
        KeyCode::Pause => ToolkitKey::PAUSE,
        KeyCode::Escape => ToolkitKey::ESCAPE,
        KeyCode::Space => ToolkitKey::SPACE,
        KeyCode::Delete => ToolkitKey::DELETE,

        KeyCode::Numpad0 => ToolkitKey(256),
        KeyCode::Numpad1 => ToolkitKey(257),
        KeyCode::Numpad2 => ToolkitKey(258),
        KeyCode::Numpad3 => ToolkitKey(259),
        KeyCode::Numpad4 => ToolkitKey(260),
        KeyCode::Numpad5 => ToolkitKey(261),
        KeyCode::Numpad6 => ToolkitKey(262),
        KeyCode::Numpad7 => ToolkitKey(263),
        KeyCode::Numpad8 => ToolkitKey(264),
        KeyCode::Numpad9 => ToolkitKey(265),
        KeyCode::NumpadDecimal => ToolkitKey::NUMPAD_DECIMAL,
        KeyCode::NumpadDivide => ToolkitKey::NUMPAD_DIVIDE,
        KeyCode::NumpadMultiply => ToolkitKey::NUMPAD_MULTIPLY,
        KeyCode::NumpadSubtract => ToolkitKey::NUMPAD_SUBTRACT,
        KeyCode::NumpadAdd => ToolkitKey::NUMPAD_ADD,
        KeyCode::NumpadEnter => ToolkitKey::NUMPAD_ENTER,
        KeyCode::NumpadEqual => ToolkitKey::NUMPAD_EQUAL,

        KeyCode::ArrowUp => ToolkitKey::ARROW_UP,
        KeyCode::ArrowDown => ToolkitKey::ARROW_DOWN,
        KeyCode::ArrowRight => ToolkitKey::ARROW_RIGHT,
        KeyCode::ArrowLeft => ToolkitKey::ARROW_LEFT,
        KeyCode::Insert => ToolkitKey::INSERT,
        KeyCode::Home => ToolkitKey::HOME,
        KeyCode::End => ToolkitKey::END,
        KeyCode::PageUp => ToolkitKey::PAGE_UP,
        KeyCode::PageDown => ToolkitKey::PAGE_DOWN,

        KeyCode::F1 => ToolkitKey(282),
        KeyCode::F2 => ToolkitKey(283),
        KeyCode::F3 => ToolkitKey(284),
        KeyCode::F4 => ToolkitKey(285),
        KeyCode::F5 => ToolkitKey(286),
        KeyCode::F6 => ToolkitKey(287),
        KeyCode::F7 => ToolkitKey(288),
        KeyCode::F8 => ToolkitKey(289),
        KeyCode::F9 => ToolkitKey(290),
        KeyCode::F10 => ToolkitKey(291),
        KeyCode::F11 => ToolkitKey(292),
        KeyCode::F12 => ToolkitKey(293),
        KeyCode::F13 => ToolkitKey(294),
        KeyCode::F14 => ToolkitKey(295),
        KeyCode::F15 => ToolkitKey(296),

        KeyCode::NumLock => ToolkitKey::NUM_LOCK,
        KeyCode::CapsLock => ToolkitKey::CAPS_LOCK,
        KeyCode::ScrollLock => ToolkitKey::SCROLL_LOCK,
        KeyCode::ShiftRight => ToolkitKey::SHIFT_RIGHT,
        KeyCode::ShiftLeft => ToolkitKey::SHIFT_LEFT,
        KeyCode::ControlRight => ToolkitKey::CONTROL_RIGHT,
        KeyCode::ControlLeft => ToolkitKey::CONTROL_LEFT,
        KeyCode::AltLeft => ToolkitKey::ALT_LEFT,
        KeyCode::AltRight => ToolkitKey::ALT_RIGHT,
        KeyCode::SuperLeft => ToolkitKey::SUPER_LEFT,
        KeyCode::SuperRight => ToolkitKey::SUPER_RIGHT,
        KeyCode::PrintScreen => ToolkitKey::PRINT_SCREEN,
        KeyCode::ContextMenu => ToolkitKey::MENU,

        _ => return None,
    };
    Some(key)
}
