//! Types d'erreur du widget.
//!
//! Seules l'initialisation (surface, moteur) peut échouer de façon visible :
//! les appels vers le moteur une fois la session démarrée sont considérés
//! comme infaillibles côté adaptateur. La configuration a son propre type,
//! que `Config::load` rabat sur les valeurs par défaut.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Échec de (re)création de la surface de rendu.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface de taille nulle ({width}x{height})")]
    EmptySize { width: u32, height: u32 },

    #[error("surface trop grande ({width}x{height})")]
    Overflow { width: u32, height: u32 },

    #[error("allocation impossible pour une surface {width}x{height}")]
    Allocation {
        width: u32,
        height: u32,
        #[source]
        source: TryReserveError,
    },
}

/// Erreur remontée par le binding du moteur.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("initialisation du moteur impossible : {0}")]
    Initialize(String),

    #[error("création du navigateur impossible : {0}")]
    CreateBrowser(String),

    #[error("le moteur n'est pas initialisé")]
    NotInitialized,

    #[error("le moteur a déjà été arrêté")]
    ShutDown,
}

/// Échec fatal au démarrage d'une session : le widget devient inutilisable.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Lecture ou écriture du fichier de configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("lecture de {} impossible : {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration invalide dans {} : {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("écriture de {} impossible : {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("sérialisation de la configuration impossible : {0}")]
    Serialize(#[from] toml::ser::Error),
}
