//! Scripts de compatibilité injectés au début de chaque chargement.
//!
//! - **Select boxes** : le moteur peint les listes déroulantes natives dans
//!   un popup séparé que le widget n'affiche pas. Un polyfill JS/CSS les
//!   remplace par des éléments DOM. Les fichiers sont lus depuis un dossier
//!   de ressources ; absents, le polyfill est simplement désactivé.
//! - **Focus polling** (mode clavier `local`) : toutes les 100 ms, le script
//!   demande ou rend le clavier selon que l'élément actif est un champ
//!   éditable.
//! - **Escape hook** : retire le focus DOM et rend le clavier. En mode
//!   `global`, seule la définition du hook est injectée (sans polling).

use std::fs;
use std::path::Path;

use tracing::{info, warn};

/// Fonction native liée côté JS pour demander le clavier.
pub const REQUEST_KEYBOARD_BINDING: &str = "__webwidget__request_keyboard";

/// Fonction native liée côté JS pour rendre le clavier.
pub const RELEASE_KEYBOARD_BINDING: &str = "__webwidget__release_keyboard";

/// Appel du hook d'échappement, exécuté dans la frame focalisée.
pub const ESCAPE_HOOK_CALL: &str = "__webwidget__on_escape()";

pub const SELECT_BOX_JS: &str = "select-box.js";
pub const SELECT_BOX_CSS: &str = "select-box.css";

/// URLs factices utilisées dans les messages d'erreur JS du moteur.
pub const SELECT_BOX_SCRIPT_URL: &str = "webwidget://compat/select-box";
pub const FOCUS_SCRIPT_URL: &str = "webwidget://compat/keyboard-focus";
pub const ESCAPE_SCRIPT_URL: &str = "webwidget://compat/escape";
pub const NAVIGATE_SCRIPT_URL: &str = "webwidget://navigate";

pub const FOCUS_POLLING_SCRIPT: &str = r#"
var __webwidget__keyboard_requested = false;
function __webwidget__keyboard_interval() {
    var element = document.activeElement;
    if (!element) {
        return;
    }
    var tag = element.tagName;
    var type = element.type;
    if (tag == "INPUT" && (type == "" || type == "text"
            || type == "password") || tag == "TEXTAREA") {
        if (!__webwidget__keyboard_requested) {
            __webwidget__request_keyboard();
            __webwidget__keyboard_requested = true;
        }
        return;
    }
    if (__webwidget__keyboard_requested) {
        __webwidget__release_keyboard();
        __webwidget__keyboard_requested = false;
    }
}
function __webwidget__on_escape() {
    if (document.activeElement) {
        document.activeElement.blur();
    }
    if (__webwidget__keyboard_requested) {
        __webwidget__release_keyboard();
        __webwidget__keyboard_requested = false;
    }
}
setInterval(__webwidget__keyboard_interval, 100);
"#;

/// Hook d'échappement seul, pour le mode `global` où le polling n'est pas
/// injecté : le clavier reste au widget, seul le focus DOM est retiré.
pub const ESCAPE_HOOK_SCRIPT: &str = r#"
function __webwidget__on_escape() {
    if (document.activeElement) {
        document.activeElement.blur();
    }
}
"#;

/// Scripts chargés une fois au démarrage de l'adaptateur.
#[derive(Debug, Clone, Default)]
pub struct CompatScripts {
    select_box: Option<String>,
}

impl CompatScripts {
    /// Aucun polyfill.
    pub fn none() -> Self {
        Self::default()
    }

    /// Charge le polyfill depuis `dir`. Un dossier absent ou illisible
    /// désactive le polyfill sans erreur.
    pub fn load(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self::none();
        };
        if !dir.is_dir() {
            warn!(
                dir = %dir.display(),
                "Dossier select-boxes introuvable, le correctif des listes déroulantes ne sera pas appliqué"
            );
            return Self::none();
        }
        let js = read_resource(&dir.join(SELECT_BOX_JS));
        let css = read_resource(&dir.join(SELECT_BOX_CSS));
        match (js, css) {
            (Some(js), Some(css)) => {
                info!(dir = %dir.display(), "Correctif select-box chargé");
                Self {
                    select_box: Some(select_box_injection(&js, &css)),
                }
            }
            _ => Self::none(),
        }
    }

    pub fn with_select_box(js: &str, css: &str) -> Self {
        Self {
            select_box: Some(select_box_injection(js, css)),
        }
    }

    /// Code complet à injecter, s'il a pu être chargé.
    pub fn select_box(&self) -> Option<&str> {
        self.select_box.as_deref()
    }
}

fn read_resource(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(error) => {
            warn!(path = %path.display(), %error, "Ressource de compatibilité illisible");
            None
        }
    }
}

/// Construit le code : le JS du polyfill, puis une balise `<style>` ajoutée
/// au `<head>` contenant la CSS aplatie sur une ligne.
pub fn select_box_injection(js: &str, css: &str) -> String {
    let css = js_string_escape(&css.replace(['\r', '\n'], ""));
    format!(
        r#"
{js}
var __webwidget_temp_head = document.getElementsByTagName('head')[0];
var __webwidget_temp_style = document.createElement('style');
__webwidget_temp_style.type = 'text/css';
__webwidget_temp_style.appendChild(document.createTextNode("{css}"));
__webwidget_temp_head.appendChild(__webwidget_temp_style);
"#
    )
}

/// Redirection JS vers `url`.
///
/// Préférée à `load_url()` : une navigation native détruit les bindings JS
/// du navigateur dans le moteur.
pub fn redirect_script(url: &url::Url) -> String {
    format!("window.location=\"{}\";", js_string_escape(url.as_str()))
}

fn js_string_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_disables_polyfill() {
        let scripts = CompatScripts::load(Some(Path::new("/nonexistent/select-boxes")));
        assert!(scripts.select_box().is_none());
        assert!(CompatScripts::load(None).select_box().is_none());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SELECT_BOX_JS), "window.selectBox = 1;").unwrap();
        fs::write(dir.path().join(SELECT_BOX_CSS), ".a {\r\n color: red;\n}").unwrap();

        let scripts = CompatScripts::load(Some(dir.path()));
        let code = scripts.select_box().unwrap();
        assert!(code.contains("window.selectBox = 1;"));
        assert!(code.contains(r#"createTextNode(".a { color: red;}")"#));
    }

    #[test]
    fn test_missing_css_disables_polyfill() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SELECT_BOX_JS), "x").unwrap();
        assert!(CompatScripts::load(Some(dir.path())).select_box().is_none());
    }

    #[test]
    fn test_css_quotes_escaped() {
        let code = select_box_injection("", r#"a::after { content: "x"; }"#);
        assert!(code.contains(r#"content: \"x\";"#));
    }

    #[test]
    fn test_focus_script_uses_bindings() {
        assert!(FOCUS_POLLING_SCRIPT.contains(&format!("{REQUEST_KEYBOARD_BINDING}()")));
        assert!(FOCUS_POLLING_SCRIPT.contains(&format!("{RELEASE_KEYBOARD_BINDING}()")));
        assert!(FOCUS_POLLING_SCRIPT.contains("function __webwidget__on_escape()"));
        assert!(ESCAPE_HOOK_CALL.starts_with("__webwidget__on_escape"));
    }

    #[test]
    fn test_redirect_script() {
        let url = url::Url::parse("https://example.com/a?b=\"c\"").unwrap();
        let script = redirect_script(&url);
        assert!(script.starts_with("window.location=\"https://example.com/a?b="));
        assert!(!script.contains("\"c\""));
    }
}
