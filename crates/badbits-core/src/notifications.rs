//! Alert delivery with ordered fallbacks.
//!
//! [`NotificationDispatcher`] walks a preference list of
//! [`DeliveryMethod`]s until one succeeds and then, unless a requested sound
//! cue already covered it, plays a sound as the last resort. Delivery
//! failures are logged and never returned to the caller.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

// ── DeliveryMethod ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMethod {
    /// Desktop notification bubble.
    Desktop,
    /// Modal system dialog.
    System,
    /// Entry appended to a local HTML page opened in the browser.
    Browser,
    /// Full-screen interrupting page.
    Dramatic,
    /// Audible cue.
    Sound,
}

impl DeliveryMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "desktop" => Some(DeliveryMethod::Desktop),
            "system" => Some(DeliveryMethod::System),
            "browser" => Some(DeliveryMethod::Browser),
            "dramatic" => Some(DeliveryMethod::Dramatic),
            "sound" => Some(DeliveryMethod::Sound),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Desktop => "desktop",
            DeliveryMethod::System => "system",
            DeliveryMethod::Browser => "browser",
            DeliveryMethod::Dramatic => "dramatic",
            DeliveryMethod::Sound => "sound",
        }
    }
}

/// Preference list for an alert style name (`quiet`, `normal`, `loud`).
///
/// `quiet` yields an empty list, meaning notifications are disabled.
pub fn methods_for_style(style: &str) -> Vec<DeliveryMethod> {
    use DeliveryMethod::*;
    match style {
        "quiet" => Vec::new(),
        "loud" => vec![Dramatic, System, Desktop, Sound],
        _ => vec![Desktop, System, Sound],
    }
}

// ── Seams ─────────────────────────────────────────────────────────────────────

/// Platform mechanism that performs one delivery attempt.
pub trait DeliveryBackend {
    fn deliver(
        &mut self,
        method: DeliveryMethod,
        title: &str,
        message: &str,
    ) -> Result<(), String>;
}

/// Anything that can raise a user-facing alert.
pub trait AlertSink {
    fn send_alert(&mut self, title: &str, message: &str);
}

// ── NotificationDispatcher ────────────────────────────────────────────────────

pub struct NotificationDispatcher<B> {
    backend: B,
    methods: Vec<DeliveryMethod>,
}

impl<B: DeliveryBackend> NotificationDispatcher<B> {
    pub fn new(backend: B, methods: Vec<DeliveryMethod>) -> Self {
        Self { backend, methods }
    }

    pub fn is_enabled(&self) -> bool {
        !self.methods.is_empty()
    }

    pub fn methods(&self) -> &[DeliveryMethod] {
        &self.methods
    }

    /// Try `methods` in order until one succeeds, then fall back to sound
    /// unless sound was requested and delivery succeeded.
    ///
    /// Returns the method that delivered the alert, if any.
    pub fn dispatch(
        &mut self,
        title: &str,
        message: &str,
        methods: &[DeliveryMethod],
    ) -> Option<DeliveryMethod> {
        let mut delivered = None;

        for &method in methods {
            match self.backend.deliver(method, title, message) {
                Ok(()) => {
                    tracing::debug!(method = method.as_str(), "alert delivered");
                    delivered = Some(method);
                    break;
                }
                Err(e) => {
                    tracing::warn!(method = method.as_str(), error = %e, "alert delivery failed");
                }
            }
        }

        let sound_requested = methods.contains(&DeliveryMethod::Sound);
        if !sound_requested || delivered.is_none() {
            match self.backend.deliver(DeliveryMethod::Sound, title, message) {
                Ok(()) => {
                    if delivered.is_none() {
                        delivered = Some(DeliveryMethod::Sound);
                    }
                }
                Err(e) => tracing::debug!(error = %e, "fallback sound failed"),
            }
        }

        delivered
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: DeliveryBackend> AlertSink for NotificationDispatcher<B> {
    fn send_alert(&mut self, title: &str, message: &str) {
        if !self.is_enabled() {
            return;
        }
        let methods = self.methods.clone();
        self.dispatch(title, message, &methods);
    }
}

// ── CommandBackend ────────────────────────────────────────────────────────────

/// Delivers alerts by shelling out to the platform's notification tools.
pub struct CommandBackend {
    app_name: String,
    os: &'static str,
    page_dir: PathBuf,
    notification_page: Option<PathBuf>,
}

impl CommandBackend {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            os: std::env::consts::OS,
            page_dir: std::env::temp_dir(),
            notification_page: None,
        }
    }

    /// Write browser pages under `dir` instead of the system temp dir.
    pub fn with_page_dir(mut self, dir: PathBuf) -> Self {
        self.page_dir = dir;
        self
    }

    fn desktop(&self, title: &str, message: &str) -> Result<(), String> {
        match self.os {
            "linux" => run(Command::new("notify-send")
                .arg(format!("--app-name={}", self.app_name))
                .arg("--icon=dialog-information")
                .arg(title)
                .arg(message)),
            "macos" => run(Command::new("osascript").arg("-e").arg(format!(
                "display notification \"{}\" with title \"{}\"",
                applescript_escape(message),
                applescript_escape(title)
            ))),
            other => Err(format!("desktop notifications unsupported on {other}")),
        }
    }

    fn system_dialog(&self, title: &str, message: &str) -> Result<(), String> {
        match self.os {
            "linux" => run(Command::new("zenity")
                .arg("--info")
                .arg(format!("--title={title}"))
                .arg(format!("--text={message}"))),
            "macos" => run(Command::new("osascript").arg("-e").arg(format!(
                "display alert \"{}\" message \"{}\"",
                applescript_escape(title),
                applescript_escape(message)
            ))),
            "windows" => run(Command::new("powershell").arg("-Command").arg(format!(
                "Add-Type -AssemblyName System.Windows.Forms; \
                 [System.Windows.Forms.MessageBox]::Show('{}', '{}')",
                message.replace('\'', "''"),
                title.replace('\'', "''")
            ))),
            other => Err(format!("system dialogs unsupported on {other}")),
        }
    }

    fn browser(&mut self, title: &str, message: &str) -> Result<(), String> {
        let entry = format!(
            "<div class=\"alert\"><h2>{}</h2><p>{}</p></div>\n</body>",
            html_escape(title),
            html_escape(message)
        );

        match &self.notification_page {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
                let updated = content.replacen("</body>", &entry, 1);
                std::fs::write(path, updated).map_err(|e| e.to_string())?;
                Ok(())
            }
            None => {
                let path = self.page_dir.join("badbits_notifications.html");
                let page = format!(
                    "<!DOCTYPE html>\n<html><head><title>{app} Notifications</title>\
                     <meta http-equiv=\"refresh\" content=\"10\">\
                     <style>body{{font-family:sans-serif;background:#f5f5f5;padding:20px}}\
                     .alert{{background:#fff;border-left:6px solid #dc3545;margin:12px 0;padding:8px 16px}}</style>\
                     </head>\n<body>\n<h1>{app} Notifications</h1>\n{entry}\n</html>\n",
                    app = html_escape(&self.app_name),
                );
                std::fs::write(&path, page).map_err(|e| e.to_string())?;
                self.open_page(&path)?;
                self.notification_page = Some(path);
                Ok(())
            }
        }
    }

    fn dramatic(&self, title: &str, message: &str) -> Result<(), String> {
        let path = self.page_dir.join("badbits_dramatic_alert.html");
        let page = format!(
            "<!DOCTYPE html>\n<html><head><title>{title}</title>\
             <style>body{{margin:0;height:100vh;display:flex;flex-direction:column;\
             justify-content:center;align-items:center;font-family:sans-serif;\
             background:rgba(220,53,69,0.95);color:white}}\
             h1{{font-size:4em}}p{{font-size:2em}}</style></head>\n\
             <body onload=\"document.documentElement.requestFullscreen && document.documentElement.requestFullscreen()\">\n\
             <h1>⚠️ {title}</h1>\n<p>{message}</p>\n\
             <button onclick=\"window.close()\">I'm on it</button>\n</body></html>\n",
            title = html_escape(title),
            message = html_escape(message),
        );
        std::fs::write(&path, page).map_err(|e| e.to_string())?;
        self.open_page(&path)
    }

    fn sound(&self) -> Result<(), String> {
        let played = match self.os {
            "linux" => run(Command::new("paplay")
                .arg("/usr/share/sounds/freedesktop/stereo/complete.oga")),
            "macos" => run(Command::new("afplay").arg("/System/Library/Sounds/Ping.aiff")),
            "windows" => run(Command::new("powershell")
                .arg("-Command")
                .arg("[System.Media.SystemSounds]::Exclamation.Play()")),
            other => Err(format!("sound unsupported on {other}")),
        };
        if played.is_ok() {
            return played;
        }
        // Terminal bell.
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|e| e.to_string())
    }

    fn open_page(&self, path: &std::path::Path) -> Result<(), String> {
        let target = path.to_string_lossy().to_string();
        match self.os {
            "linux" => run(Command::new("xdg-open").arg(&target)),
            "macos" => run(Command::new("open").arg(&target)),
            "windows" => run(Command::new("cmd").args(["/C", "start", "", &target])),
            other => Err(format!("cannot open browser on {other}")),
        }
    }
}

impl DeliveryBackend for CommandBackend {
    fn deliver(
        &mut self,
        method: DeliveryMethod,
        title: &str,
        message: &str,
    ) -> Result<(), String> {
        match method {
            DeliveryMethod::Desktop => self.desktop(title, message),
            DeliveryMethod::System => self.system_dialog(title, message),
            DeliveryMethod::Browser => self.browser(title, message),
            DeliveryMethod::Dramatic => {
                self.dramatic(title, message)?;
                // Best effort; the page already interrupted the user.
                let _ = self.sound();
                Ok(())
            }
            DeliveryMethod::Sound => self.sound(),
        }
    }
}

fn run(cmd: &mut Command) -> Result<(), String> {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| e.to_string())?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("exited with {status}"))
    }
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use DeliveryMethod::*;

    /// Backend that records every attempt and fails the configured methods.
    #[derive(Default)]
    struct FakeBackend {
        failing: HashSet<DeliveryMethod>,
        attempts: Vec<DeliveryMethod>,
    }

    impl FakeBackend {
        fn failing(methods: &[DeliveryMethod]) -> Self {
            Self {
                failing: methods.iter().copied().collect(),
                attempts: Vec::new(),
            }
        }
    }

    impl DeliveryBackend for FakeBackend {
        fn deliver(&mut self, method: DeliveryMethod, _: &str, _: &str) -> Result<(), String> {
            self.attempts.push(method);
            if self.failing.contains(&method) {
                Err("boom".to_string())
            } else {
                Ok(())
            }
        }
    }

    // ── method names ──────────────────────────────────────────────────────

    #[test]
    fn test_method_name_round_trip() {
        for m in [Desktop, System, Browser, Dramatic, Sound] {
            assert_eq!(DeliveryMethod::from_name(m.as_str()), Some(m));
        }
        assert_eq!(DeliveryMethod::from_name("carrier-pigeon"), None);
    }

    #[test]
    fn test_methods_for_style() {
        assert!(methods_for_style("quiet").is_empty());
        assert_eq!(methods_for_style("normal"), vec![Desktop, System, Sound]);
        assert_eq!(methods_for_style("loud"), vec![Dramatic, System, Desktop, Sound]);
    }

    // ── dispatch ──────────────────────────────────────────────────────────

    #[test]
    fn test_first_success_stops_without_extra_sound_when_sound_requested() {
        let mut d = NotificationDispatcher::new(FakeBackend::default(), vec![]);
        let used = d.dispatch("t", "m", &[Desktop, System, Sound]);
        assert_eq!(used, Some(Desktop));
        assert_eq!(d.backend().attempts, vec![Desktop]);
    }

    #[test]
    fn test_falls_through_to_next_method() {
        let mut d = NotificationDispatcher::new(FakeBackend::failing(&[Desktop]), vec![]);
        let used = d.dispatch("t", "m", &[Desktop, System, Sound]);
        assert_eq!(used, Some(System));
        assert_eq!(d.backend().attempts, vec![Desktop, System]);
    }

    #[test]
    fn test_sound_always_played_when_not_requested() {
        let mut d = NotificationDispatcher::new(FakeBackend::default(), vec![]);
        let used = d.dispatch("t", "m", &[Desktop]);
        assert_eq!(used, Some(Desktop));
        assert_eq!(d.backend().attempts, vec![Desktop, Sound]);
    }

    #[test]
    fn test_all_fail_then_sound_fallback() {
        let mut d =
            NotificationDispatcher::new(FakeBackend::failing(&[Desktop, System]), vec![]);
        let used = d.dispatch("t", "m", &[Desktop, System]);
        assert_eq!(used, Some(Sound));
        assert_eq!(d.backend().attempts, vec![Desktop, System, Sound]);
    }

    #[test]
    fn test_everything_fails_is_silent() {
        let mut d = NotificationDispatcher::new(
            FakeBackend::failing(&[Desktop, System, Sound]),
            vec![],
        );
        let used = d.dispatch("t", "m", &[Desktop, System, Sound]);
        assert_eq!(used, None);
        // Requested sound failed, so the fallback retries it once.
        assert_eq!(d.backend().attempts, vec![Desktop, System, Sound, Sound]);
    }

    // ── AlertSink ─────────────────────────────────────────────────────────

    #[test]
    fn test_quiet_dispatcher_sends_nothing() {
        let mut d = NotificationDispatcher::new(FakeBackend::default(), methods_for_style("quiet"));
        assert!(!d.is_enabled());
        d.send_alert("t", "m");
        assert!(d.backend().attempts.is_empty());
    }

    #[test]
    fn test_sink_uses_configured_methods() {
        let mut d = NotificationDispatcher::new(
            FakeBackend::failing(&[Dramatic]),
            methods_for_style("loud"),
        );
        d.send_alert("t", "m");
        assert_eq!(d.backend().attempts, vec![Dramatic, System]);
    }

    // ── escaping ──────────────────────────────────────────────────────────

    #[test]
    fn test_escaping() {
        assert_eq!(applescript_escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(html_escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }

    #[test]
    fn test_browser_page_accumulates_entries() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("badbits_notifications.html");
        std::fs::write(&path, "<html><body>\n</body></html>").unwrap();

        let mut backend = CommandBackend::new("BadBits").with_page_dir(tmp.path().to_path_buf());
        backend.notification_page = Some(path.clone());
        backend.browser("First", "one").unwrap();
        backend.browser("Second", "two <b>").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<h2>First</h2>"));
        assert!(content.contains("two &lt;b&gt;"));
        assert_eq!(content.matches("</body>").count(), 1);
    }
}
