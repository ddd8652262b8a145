//! Shell hôte Winit : une fenêtre, un widget navigateur plein cadre.
//!
//! ## Pattern "Two-Phase App"
//!
//! Winit 0.30 impose que les fenêtres soient créées dans `resumed()`. On
//! garde donc un enum à deux états :
//!
//! ```text
//! HostApp::Initial { adapter, options }  →  [resumed()]  →  HostApp::Running(HostState)
//! ```
//!
//! ## Flux
//!
//! ```text
//! Winit (thread principal, ControlFlow::Poll)
//!   ├─ window_event()  → BrowserWidget (resize, souris, clavier)
//!   │                       └─ Browser::send_* (moteur)
//!   └─ about_to_wait() → BrowserWidget::tick() → Engine::message_loop_work()
//!                            └─ ClientSink::on_paint → RenderSurface
//!                                 └─ request_redraw → softbuffer present
//! ```
//!
//! Winit place l'origine en haut à gauche ; le widget attend des
//! coordonnées toolkit (origine en bas à gauche), converties par
//! [`toolkit_touch`].

use std::error::Error;
use std::num::NonZeroU32;
use std::rc::Rc;

use euclid::default::{Point2D, Rect, Size2D};
use softbuffer::{Context, Surface};
use tracing::{debug, error, warn};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, KeyCode, ModifiersState, NamedKey, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::Config;
use crate::engine::Engine;
use crate::input::{MOUSE_TOUCH_ID, Touch, WidgetBounds};
use crate::keyutils;
use crate::modifiers::KeyModifiers;
use crate::widget::{Adapter, BrowserWidget, WidgetOptions};

/// Lance la boucle Winit avec `engine` jusqu'à la fermeture de la fenêtre,
/// puis arrête le moteur.
pub fn run(engine: Rc<dyn Engine>, config: Config) -> Result<(), Box<dyn Error>> {
    crate::logging::init();

    let options = WidgetOptions::from_config(&config)?;
    let adapter = Adapter::from_config(engine, &config);

    let event_loop = EventLoop::new()?;
    // La pompe du moteur doit tourner à chaque itération, même sans événement.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = HostApp::new(adapter.clone(), options, &config);
    let result = event_loop.run_app(&mut app);

    // Les widgets sont détruits avant l'arrêt du moteur.
    drop(app);
    adapter.shutdown();

    Ok(result?)
}

/// Toucher toolkit correspondant à une position curseur Winit.
///
/// Le curseur est ramené au centre de sa rangée de pixels : la rangée du
/// haut (y = 0) reste strictement sous `window_height`.
pub fn toolkit_touch(position: PhysicalPosition<f64>, window_height: f64) -> Touch {
    let last_row = (window_height - 1.0).max(0.0);
    let row = position.y.floor().clamp(0.0, last_row);
    Touch::new(MOUSE_TOUCH_ID, position.x, window_height - row - 0.5)
}

/// Zone du widget pour une fenêtre de taille `size` (plein cadre).
pub fn full_window_bounds(size: PhysicalSize<u32>) -> WidgetBounds {
    Rect::new(
        Point2D::origin(),
        Size2D::new(size.width as f64, size.height as f64),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// HostApp : enum deux phases
// ─────────────────────────────────────────────────────────────────────────────

pub enum HostApp {
    /// Phase pré-initialisation : on attend que Winit appelle `resumed()`.
    Initial {
        adapter: Rc<Adapter>,
        options: WidgetOptions,
        title: String,
        size: LogicalSize<f64>,
    },

    /// Phase opérationnelle : fenêtre et widget créés.
    Running(Box<HostState>),
}

impl HostApp {
    pub fn new(adapter: Rc<Adapter>, options: WidgetOptions, config: &Config) -> Self {
        Self::Initial {
            adapter,
            options,
            title: config.general.window_title.clone(),
            size: LogicalSize::new(config.window.width as f64, config.window.height as f64),
        }
    }
}

/// État de la phase `Running`.
pub struct HostState {
    window: Rc<Window>,
    surface: Surface<Rc<Window>, Rc<Window>>,
    _context: Context<Rc<Window>>,
    widget: BrowserWidget,
    modifiers: ModifiersState,
    /// Winit ne rapporte pas l'état du verrouillage majuscule.
    caps_lock: bool,
    cursor: PhysicalPosition<f64>,
    pointer_down: bool,
}

impl HostState {
    fn touch(&self) -> Touch {
        toolkit_touch(self.cursor, self.window.inner_size().height as f64)
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let Err(error) = self.widget.resize(full_window_bounds(size)) {
            error!(%error, "Widget navigateur inutilisable");
        }
        self.window.request_redraw();
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state == ElementState::Pressed
            && !event.repeat
            && event.physical_key == PhysicalKey::Code(KeyCode::CapsLock)
        {
            self.caps_lock = !self.caps_lock;
        }

        if self.handle_shortcut(event) {
            return;
        }

        let Some(key) = keyutils::toolkit_key_from_winit(&event.logical_key, &event.physical_key)
        else {
            debug!(logical = ?event.logical_key, "Touche sans code toolkit, ignorée");
            return;
        };

        match event.state {
            ElementState::Pressed => self
                .widget
                .on_key_down(key, KeyModifiers::from_winit(self.modifiers, self.caps_lock)),
            ElementState::Released => self.widget.on_key_up(key),
        }
    }

    /// Raccourcis de l'hôte (Alt+←, Alt+→, F5). Les deux transitions de la
    /// touche sont consommées ; l'action a lieu à l'appui.
    fn handle_shortcut(&self, event: &KeyEvent) -> bool {
        let pressed = event.state == ElementState::Pressed;
        match event.logical_key {
            Key::Named(NamedKey::ArrowLeft) if self.modifiers.alt_key() => {
                if pressed {
                    self.widget.go_back();
                }
                true
            }
            Key::Named(NamedKey::ArrowRight) if self.modifiers.alt_key() => {
                if pressed {
                    self.widget.go_forward();
                }
                true
            }
            Key::Named(NamedKey::F5) => {
                if pressed {
                    self.widget.reload();
                }
                true
            }
            _ => false,
        }
    }

    fn present(&mut self) {
        let size = self.window.inner_size();
        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return;
        };
        if let Err(error) = self.surface.resize(width, height) {
            warn!(%error, "Redimensionnement du framebuffer impossible");
            return;
        }
        let mut buffer = match self.surface.buffer_mut() {
            Ok(buffer) => buffer,
            Err(error) => {
                warn!(%error, "Framebuffer indisponible");
                return;
            }
        };

        match self.widget.surface() {
            Some(surface) => surface.write_xrgb(&mut buffer, size.width, size.height),
            None => buffer.fill(0),
        }

        self.window.pre_present_notify();
        if let Err(error) = buffer.present() {
            warn!(%error, "Présentation du framebuffer impossible");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ApplicationHandler : dispatch des événements Winit
// ─────────────────────────────────────────────────────────────────────────────

impl ApplicationHandler for HostApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Self::Initial {
            adapter,
            options,
            title,
            size,
        } = self
        else {
            return;
        };

        // ── 1. Fenêtre ─────────────────────────────────────────────────
        let attributes = Window::default_attributes()
            .with_title(title.clone())
            .with_inner_size(*size);
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Rc::new(window),
            Err(error) => {
                error!(%error, "Impossible de créer la fenêtre Winit");
                event_loop.exit();
                return;
            }
        };

        // ── 2. Framebuffer CPU ─────────────────────────────────────────
        let context = match Context::new(window.clone()) {
            Ok(context) => context,
            Err(error) => {
                error!(%error, "Contexte softbuffer indisponible");
                event_loop.exit();
                return;
            }
        };
        let surface = match Surface::new(&context, window.clone()) {
            Ok(surface) => surface,
            Err(error) => {
                error!(%error, "Surface softbuffer indisponible");
                event_loop.exit();
                return;
            }
        };

        // ── 3. Widget (le moteur démarre au premier resize) ───────────
        let widget = adapter.create_widget(options.clone());
        let mut state = HostState {
            window,
            surface,
            _context: context,
            widget,
            modifiers: ModifiersState::default(),
            caps_lock: false,
            cursor: PhysicalPosition::new(0.0, 0.0),
            pointer_down: false,
        };
        let inner_size = state.window.inner_size();
        state.resize(inner_size);

        // ── 4. Transition Initial → Running ────────────────────────────
        *self = Self::Running(Box::new(state));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Self::Running(state) = self else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                state.widget.teardown();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => state.resize(size),

            WindowEvent::ModifiersChanged(modifiers) => {
                state.modifiers = modifiers.state();
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = position;
                if state.pointer_down {
                    state.widget.on_touch_move(&state.touch());
                }
            }

            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => {
                    state.pointer_down = state.widget.on_touch_down(&state.touch());
                }
                ElementState::Released => {
                    if std::mem::take(&mut state.pointer_down) {
                        state.widget.on_touch_up(&state.touch());
                    }
                }
            },

            WindowEvent::KeyboardInput { event, .. } => state.handle_key(&event),

            WindowEvent::RedrawRequested => state.present(),

            _ => (),
        }
    }

    /// Fin d'itération : pompe du moteur, puis redraw si une frame est arrivée.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Self::Running(state) = self {
            state.widget.tick();
            if state.widget.take_surface_dirty() {
                state.window.request_redraw();
            }
        }
    }
}
