//! Initialisation du tracing.
//!
//! `RUST_LOG` a priorité ; à défaut seul ce crate journalise, au niveau `info`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "webwidget=info";

/// Installe le subscriber `fmt` global. Sans effet si l'embedder en a déjà
/// installé un.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("Subscriber tracing déjà installé");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init();
        init();
    }
}
