//! Moteur factice qui enregistre chaque appel reçu.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use euclid::default::{Point2D, Rect, Size2D};
use url::Url;

use webwidget::client::ClientHandler;
use webwidget::config::{EngineSettings, KeyboardMode};
use webwidget::engine::{
    Browser, BrowserId, Engine, Frame, JavascriptBindings, JsDialogCallback, KeyEvent,
    MouseButton, PaintElementType, WindowInfo,
};
use webwidget::error::EngineError;
use webwidget::input::WidgetBounds;
use webwidget::scripts::CompatScripts;
use webwidget::widget::{Adapter, BrowserWidget, WidgetOptions};

pub const START_URL: &str = "https://example.com/";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initialize,
    CreateBrowser(String),
    Pump,
    Shutdown,
    Key(KeyEvent),
    MouseClick { x: i32, y: i32, mouse_up: bool },
    MouseMove { x: i32, y: i32 },
    Focus(bool),
    WasResized,
    LoadUrl(String),
    StopLoad,
    Reload,
    GoBack,
    GoForward,
    SetClientHandler,
    SetBindings(Vec<String>),
    Close,
    Javascript { main: bool, code: String, script_url: String },
}

pub type Log = Rc<RefCell<Vec<Call>>>;

// ─────────────────────────────────────────────────────────────────────────────
// Frame
// ─────────────────────────────────────────────────────────────────────────────

pub struct FakeFrame {
    main: bool,
    url: Option<Url>,
    log: Log,
}

impl FakeFrame {
    pub fn new(main: bool, log: Log) -> Rc<Self> {
        Rc::new(Self {
            main,
            url: Url::parse(START_URL).ok(),
            log,
        })
    }
}

impl Frame for FakeFrame {
    fn is_main(&self) -> bool {
        self.main
    }

    fn url(&self) -> Option<Url> {
        self.url.clone()
    }

    fn execute_javascript(&self, code: &str, script_url: &str) {
        self.log.borrow_mut().push(Call::Javascript {
            main: self.main,
            code: code.to_string(),
            script_url: script_url.to_string(),
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Browser
// ─────────────────────────────────────────────────────────────────────────────

pub struct RecordingBrowser {
    id: BrowserId,
    log: Log,
    main_frame: Rc<FakeFrame>,
    focused_frame: RefCell<Option<Rc<FakeFrame>>>,
    handler: RefCell<Option<Rc<dyn ClientHandler>>>,
    bindings: RefCell<Option<JavascriptBindings>>,
    /// Réponses de `get_view_rect` obtenues à chaque `was_resized`.
    view_rects: RefCell<Vec<Option<Rect<i32>>>>,
}

impl RecordingBrowser {
    fn new(id: BrowserId, log: Log) -> Self {
        Self {
            id,
            main_frame: FakeFrame::new(true, log.clone()),
            log,
            focused_frame: RefCell::new(None),
            handler: RefCell::new(None),
            bindings: RefCell::new(None),
            view_rects: RefCell::new(Vec::new()),
        }
    }

    pub fn handler(&self) -> Rc<dyn ClientHandler> {
        self.handler
            .borrow()
            .clone()
            .expect("client handler not set")
    }

    pub fn call_binding(&self, name: &str) -> bool {
        let bindings = self.bindings.borrow().clone();
        bindings.is_some_and(|bindings| bindings.call(name))
    }

    pub fn binding_names(&self) -> Vec<String> {
        self.bindings
            .borrow()
            .as_ref()
            .map(|bindings| bindings.names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn focus_subframe(&self) {
        *self.focused_frame.borrow_mut() = Some(FakeFrame::new(false, self.log.clone()));
    }

    pub fn last_view_rect(&self) -> Option<Rect<i32>> {
        self.view_rects.borrow().last().copied().flatten()
    }

    pub fn view_rect_queries(&self) -> usize {
        self.view_rects.borrow().len()
    }

    pub fn paint(&self, element: PaintElementType, buffer: &[u8], width: u32, height: u32) -> bool {
        let dirty = [Rect::new(
            Point2D::origin(),
            Size2D::new(width as i32, height as i32),
        )];
        self.handler()
            .on_paint(self, element, &dirty, buffer, width, height)
    }

    pub fn load_start(&self, main: bool) {
        let frame = FakeFrame::new(main, self.log.clone());
        self.handler().on_load_start(self, &*frame);
    }

    pub fn load_end(&self, main: bool, status: i32) {
        let frame = FakeFrame::new(main, self.log.clone());
        self.handler().on_load_end(self, &*frame, status);
    }

    fn push(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl Browser for RecordingBrowser {
    fn id(&self) -> BrowserId {
        self.id
    }

    fn main_frame(&self) -> Rc<dyn Frame> {
        self.main_frame.clone()
    }

    fn focused_frame(&self) -> Option<Rc<dyn Frame>> {
        self.focused_frame
            .borrow()
            .clone()
            .map(|frame| frame as Rc<dyn Frame>)
    }

    fn send_key_event(&self, event: &KeyEvent) {
        self.push(Call::Key(*event));
    }

    fn send_mouse_click_event(
        &self,
        x: i32,
        y: i32,
        button: MouseButton,
        mouse_up: bool,
        _click_count: u32,
    ) {
        assert_eq!(button, MouseButton::Left);
        self.push(Call::MouseClick { x, y, mouse_up });
    }

    fn send_mouse_move_event(&self, x: i32, y: i32, _mouse_leave: bool) {
        self.push(Call::MouseMove { x, y });
    }

    fn send_focus_event(&self, focus: bool) {
        self.push(Call::Focus(focus));
    }

    /// Comme le vrai moteur : rappelle aussitôt `get_view_rect`.
    fn was_resized(&self) {
        self.push(Call::WasResized);
        let handler = self.handler.borrow().clone();
        if let Some(handler) = handler {
            let rect = handler.get_view_rect(self);
            self.view_rects.borrow_mut().push(rect);
        }
    }

    fn load_url(&self, url: &Url) {
        self.push(Call::LoadUrl(url.to_string()));
    }

    fn stop_load(&self) {
        self.push(Call::StopLoad);
    }

    fn reload(&self) {
        self.push(Call::Reload);
    }

    fn go_back(&self) {
        self.push(Call::GoBack);
    }

    fn go_forward(&self) {
        self.push(Call::GoForward);
    }

    fn set_client_handler(&self, handler: Rc<dyn ClientHandler>) {
        self.push(Call::SetClientHandler);
        *self.handler.borrow_mut() = Some(handler);
    }

    fn set_javascript_bindings(&self, bindings: JavascriptBindings) {
        self.push(Call::SetBindings(bindings.names().map(str::to_string).collect()));
        *self.bindings.borrow_mut() = Some(bindings);
    }

    fn close(&self) {
        self.push(Call::Close);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingEngine {
    pub log: Log,
    next_id: Cell<u64>,
    pub fail_initialize: bool,
    pub fail_create: bool,
    browsers: RefCell<Vec<Rc<RecordingBrowser>>>,
}

impl RecordingEngine {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn failing_initialize() -> Rc<Self> {
        Rc::new(Self {
            fail_initialize: true,
            ..Self::default()
        })
    }

    pub fn failing_create() -> Rc<Self> {
        Rc::new(Self {
            fail_create: true,
            ..Self::default()
        })
    }

    pub fn browser(&self, index: usize) -> Rc<RecordingBrowser> {
        self.browsers.borrow()[index].clone()
    }

    pub fn browser_count(&self) -> usize {
        self.browsers.borrow().len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.log.borrow().iter().filter(|call| predicate(call)).count()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn key_events(&self) -> Vec<KeyEvent> {
        self.log
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Key(event) => Some(*event),
                _ => None,
            })
            .collect()
    }

    pub fn scripts(&self) -> Vec<(bool, String, String)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Javascript {
                    main,
                    code,
                    script_url,
                } => Some((*main, code.clone(), script_url.clone())),
                _ => None,
            })
            .collect()
    }
}

impl Engine for RecordingEngine {
    fn initialize(&self, _settings: &EngineSettings) -> Result<(), EngineError> {
        self.log.borrow_mut().push(Call::Initialize);
        if self.fail_initialize {
            return Err(EngineError::Initialize("subprocess not found".to_string()));
        }
        Ok(())
    }

    fn create_browser(&self, window: &WindowInfo, url: &Url) -> Result<Rc<dyn Browser>, EngineError> {
        assert!(window.windowless_rendering);
        self.log.borrow_mut().push(Call::CreateBrowser(url.to_string()));
        if self.fail_create {
            return Err(EngineError::CreateBrowser("renderer crashed".to_string()));
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let browser = Rc::new(RecordingBrowser::new(BrowserId(id), self.log.clone()));
        self.browsers.borrow_mut().push(browser.clone());
        Ok(browser as Rc<dyn Browser>)
    }

    fn message_loop_work(&self) {
        self.log.borrow_mut().push(Call::Pump);
    }

    fn shutdown(&self) {
        self.log.borrow_mut().push(Call::Shutdown);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dialogues
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingCallback {
    pub calls: RefCell<Vec<(bool, String)>>,
}

impl JsDialogCallback for RecordingCallback {
    fn proceed(&self, allow: bool, user_input: &str) {
        self.calls.borrow_mut().push((allow, user_input.to_string()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn bounds(width: f64, height: f64) -> WidgetBounds {
    Rect::new(Point2D::origin(), Size2D::new(width, height))
}

pub fn adapter(engine: &Rc<RecordingEngine>) -> Rc<Adapter> {
    Adapter::new(engine.clone(), EngineSettings::default(), CompatScripts::none())
}

pub fn options(keyboard_mode: KeyboardMode) -> WidgetOptions {
    WidgetOptions {
        start_url: Url::parse(START_URL).unwrap(),
        keyboard_mode,
    }
}

/// Widget démarré à 800x600.
pub fn started_widget(engine: &Rc<RecordingEngine>, keyboard_mode: KeyboardMode) -> BrowserWidget {
    let mut widget = adapter(engine).create_widget(options(keyboard_mode));
    widget.resize(bounds(800.0, 600.0)).unwrap();
    widget
}

/// Frame BGRA unie.
pub fn solid_frame(width: u32, height: u32, bgra: [u8; 4]) -> Vec<u8> {
    bgra.repeat((width * height) as usize)
}
