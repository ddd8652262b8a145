//! Suivi de l'état des modificateurs clavier.
//!
//! Le toolkit ne fournit la liste des modificateurs qu'à l'appui d'une touche
//! (`key_down`), jamais au relâchement. Or le moteur attend le masque sur
//! `CHAR` et `KEYUP` aussi : on mémorise donc l'état des six touches
//! modificatrices entre les transitions.

use winit::keyboard::ModifiersState;

use crate::engine::EventFlags;
use crate::keyutils::ToolkitKey;

/// Modificateurs rapportés par le toolkit sur un `key_down`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub caps_lock: bool,
}

impl KeyModifiers {
    pub fn event_flags(self) -> EventFlags {
        let mut flags = EventFlags::empty();
        if self.shift {
            flags |= EventFlags::SHIFT_DOWN;
        }
        if self.ctrl {
            flags |= EventFlags::CONTROL_DOWN;
        }
        if self.alt {
            flags |= EventFlags::ALT_DOWN;
        }
        if self.caps_lock {
            flags |= EventFlags::CAPS_LOCK_ON;
        }
        flags
    }

    /// Winit ne rapporte pas le verrouillage majuscule : l'hôte le suit à part.
    pub fn from_winit(state: ModifiersState, caps_lock: bool) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            caps_lock,
        }
    }
}

/// État pressé des six touches modificatrices d'une session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    shift_left: bool,
    shift_right: bool,
    ctrl_left: bool,
    ctrl_right: bool,
    alt_left: bool,
    alt_right: bool,
}

impl ModifierState {
    /// Marque `key` comme enfoncée. Retourne `false` si ce n'est pas un modificateur.
    pub fn press(&mut self, key: ToolkitKey) -> bool {
        self.set(key, true)
    }

    /// Marque `key` comme relâchée. Retourne `false` si ce n'est pas un modificateur.
    pub fn release(&mut self, key: ToolkitKey) -> bool {
        self.set(key, false)
    }

    fn set(&mut self, key: ToolkitKey, pressed: bool) -> bool {
        let slot = match key {
            ToolkitKey::SHIFT_LEFT => &mut self.shift_left,
            ToolkitKey::SHIFT_RIGHT => &mut self.shift_right,
            ToolkitKey::CONTROL_LEFT => &mut self.ctrl_left,
            ToolkitKey::CONTROL_RIGHT => &mut self.ctrl_right,
            ToolkitKey::ALT_LEFT => &mut self.alt_left,
            ToolkitKey::ALT_RIGHT => &mut self.alt_right,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }

    /// Masque à joindre aux événements `CHAR` / `KEYUP`.
    ///
    /// Alt droit est AltGr : il compose des caractères et ne positionne pas
    /// `ALT_DOWN`.
    pub fn event_flags(&self) -> EventFlags {
        let mut flags = EventFlags::empty();
        if self.shift_left || self.shift_right {
            flags |= EventFlags::SHIFT_DOWN;
        }
        if self.ctrl_left || self.ctrl_right {
            flags |= EventFlags::CONTROL_DOWN;
        }
        if self.alt_left {
            flags |= EventFlags::ALT_DOWN;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODIFIER_KEYS: [ToolkitKey; 6] = [
        ToolkitKey::SHIFT_LEFT,
        ToolkitKey::SHIFT_RIGHT,
        ToolkitKey::CONTROL_LEFT,
        ToolkitKey::CONTROL_RIGHT,
        ToolkitKey::ALT_LEFT,
        ToolkitKey::ALT_RIGHT,
    ];

    #[test]
    fn test_down_up_pair_clears_every_modifier() {
        for key in MODIFIER_KEYS {
            let mut state = ModifierState::default();
            assert!(state.press(key));
            assert!(!state.is_clear());
            assert!(state.release(key));
            assert!(state.is_clear(), "{key:?}");
        }
    }

    #[test]
    fn test_non_modifier_ignored() {
        let mut state = ModifierState::default();
        assert!(!state.press(ToolkitKey(97)));
        assert!(state.is_clear());
    }

    #[test]
    fn test_flags_from_either_side() {
        let mut state = ModifierState::default();
        state.press(ToolkitKey::SHIFT_RIGHT);
        state.press(ToolkitKey::CONTROL_LEFT);
        let flags = state.event_flags();
        assert!(flags.contains(EventFlags::SHIFT_DOWN));
        assert!(flags.contains(EventFlags::CONTROL_DOWN));
        assert!(!flags.contains(EventFlags::ALT_DOWN));
    }

    #[test]
    fn test_alt_gr_does_not_set_alt() {
        let mut state = ModifierState::default();
        state.press(ToolkitKey::ALT_RIGHT);
        assert_eq!(state.event_flags(), EventFlags::empty());
        state.press(ToolkitKey::ALT_LEFT);
        assert_eq!(state.event_flags(), EventFlags::ALT_DOWN);
    }

    #[test]
    fn test_reset() {
        let mut state = ModifierState::default();
        for key in MODIFIER_KEYS {
            state.press(key);
        }
        state.reset();
        assert!(state.is_clear());
    }

    #[test]
    fn test_key_modifiers_flags() {
        let mods = KeyModifiers {
            shift: true,
            caps_lock: true,
            ..KeyModifiers::default()
        };
        assert_eq!(mods.event_flags(), EventFlags::SHIFT_DOWN | EventFlags::CAPS_LOCK_ON);
        assert_eq!(KeyModifiers::default().event_flags(), EventFlags::empty());
    }

    #[test]
    fn test_key_modifiers_from_winit() {
        let mods = KeyModifiers::from_winit(ModifiersState::CONTROL | ModifiersState::ALT, false);
        assert!(mods.ctrl);
        assert!(mods.alt);
        assert!(!mods.shift);
        assert!(!mods.caps_lock);
    }
}
