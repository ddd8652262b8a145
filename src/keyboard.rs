//! Attribution exclusive du clavier toolkit.
//!
//! Un seul widget à la fois reçoit les événements clavier de l'hôte. Le
//! routeur délivre des [`KeyboardGrant`] ; un nouveau `request` révoque
//! implicitement le précédent détenteur, qui cesse alors de recevoir les
//! touches (son grant n'est plus courant).

use std::cell::Cell;

use tracing::debug;

use crate::engine::BrowserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardGrant {
    id: u64,
    owner: BrowserId,
}

impl KeyboardGrant {
    pub fn owner(&self) -> BrowserId {
        self.owner
    }
}

#[derive(Debug, Default)]
pub struct KeyboardRouter {
    next_id: Cell<u64>,
    current: Cell<Option<KeyboardGrant>>,
}

impl KeyboardRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, owner: BrowserId) -> KeyboardGrant {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let grant = KeyboardGrant { id, owner };
        if let Some(previous) = self.current.replace(Some(grant)) {
            debug!(from = %previous.owner, to = %owner, "Clavier réattribué");
        }
        grant
    }

    /// Libère `grant` s'il est encore courant. Retourne `false` sinon.
    pub fn release(&self, grant: KeyboardGrant) -> bool {
        if self.current.get() == Some(grant) {
            self.current.set(None);
            true
        } else {
            false
        }
    }

    pub fn is_current(&self, grant: KeyboardGrant) -> bool {
        self.current.get() == Some(grant)
    }

    pub fn owner(&self) -> Option<BrowserId> {
        self.current.get().map(|grant| grant.owner)
    }

    /// Nombre total de grants délivrés.
    pub fn issued(&self) -> u64 {
        self.next_id.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_then_release() {
        let router = KeyboardRouter::new();
        let grant = router.request(BrowserId(1));
        assert_eq!(router.owner(), Some(BrowserId(1)));
        assert!(router.release(grant));
        assert_eq!(router.owner(), None);
        assert!(!router.release(grant));
    }

    #[test]
    fn test_new_request_revokes_previous() {
        let router = KeyboardRouter::new();
        let first = router.request(BrowserId(1));
        let second = router.request(BrowserId(2));
        assert!(!router.is_current(first));
        assert!(router.is_current(second));
        // Un grant révoqué ne libère pas le détenteur courant
        assert!(!router.release(first));
        assert_eq!(router.owner(), Some(BrowserId(2)));
        assert_eq!(router.issued(), 2);
    }
}
