//! # webwidget — Widget navigateur off-screen
//!
//! Intègre un moteur web natif en mode off-screen dans une application
//! fenêtrée : le moteur peint dans un buffer mémoire, recopié dans une
//! surface que l'hôte présente ; les entrées de l'hôte sont traduites en
//! événements injectés dans le moteur.
//!
//! ## Architecture des modules
//!
//! - [`engine`] : Contrat du moteur natif (`Engine`, `Browser`, `Frame`),
//!   types d'événements injectés et bindings JavaScript.
//!
//! - [`client`] : Callbacks moteur → embedder (`ClientHandler`) et leur
//!   implémentation partagée `ClientSink` (peinture, chargement, dialogues).
//!
//! - [`widget`] : `BrowserWidget` (cycle de vie, démarrage différé au premier
//!   redimensionnement) et `Adapter`, l'état partagé entre widgets.
//!
//! - [`session`] : État d'un widget démarré et registre handle → session.
//!
//! - [`input`] / [`modifiers`] / [`keyutils`] : Traduction pointeur et
//!   clavier, suivi des modificateurs, codes de touches.
//!
//! - [`keyboard`] : Attribution exclusive du clavier entre widgets.
//!
//! - [`surface`] : Surface de rendu BGRA.
//!
//! - [`scripts`] : JavaScript injecté (polyfill select-box, suivi du focus,
//!   hook Échap, redirection).
//!
//! - [`runtime`] : Initialisation unique, pompe et arrêt du moteur.
//!
//! - [`host`] : Shell Winit + softbuffer, pour un embedder qui n'a pas de
//!   toolkit propre.
//!
//! - [`config`] / [`logging`] / [`error`] : Configuration TOML, tracing,
//!   erreurs typées.

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod input;
pub mod keyboard;
pub mod keyutils;
pub mod logging;
pub mod modifiers;
pub mod runtime;
pub mod scripts;
pub mod session;
pub mod surface;
pub mod widget;
