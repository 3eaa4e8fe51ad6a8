use colored::{Color, ColoredString, Colorize};
use std::fmt::Display;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::config::RunConfig;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Leveled, tagged text logger handed to plugins.
///
/// Every level writes to the same stream (stdout unless redirected with
/// [`Logger::to_writer`]), so errors cannot be told apart by stream.
/// Clones share the underlying writer.
#[derive(Clone)]
pub struct Logger {
    package_name: String,
    run_id: String,
    debug: bool,
    color: bool,
    out: SharedWriter,
}

impl Logger {
    pub fn new(package_name: impl Into<String>, config: &RunConfig) -> Self {
        Self {
            package_name: package_name.into(),
            run_id: config.run_id.clone(),
            debug: config.debug,
            color: true,
            out: Arc::new(Mutex::new(Box::new(std::io::stdout()))),
        }
    }

    pub fn to_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.out = Arc::new(Mutex::new(Box::new(writer)));
        self
    }

    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn log(&self, message: impl Display) {
        let line = format!("{} ({}) {}", self.tint(&self.tag(), Color::Cyan), self.package_name, message);
        self.emit(&line);
    }

    /// No-op unless debug mode is on.
    pub fn debug(&self, message: impl Display) {
        if !self.debug {
            return;
        }
        let line = format!(
            "{} ({}) {} {}",
            self.tint(&self.tag(), Color::Cyan),
            self.package_name,
            self.tint("DEBUG", Color::Magenta),
            message
        );
        self.emit(&line);
    }

    pub fn warn(&self, message: impl Display) {
        let line = format!(
            "{} ({}) {} {}",
            self.tint(&self.tag(), Color::Cyan),
            self.package_name,
            self.tint("WARN", Color::Yellow),
            message
        );
        self.emit(&line);
    }

    pub fn error(&self, message: impl Display) {
        let head = format!("{} ({}) ERROR", self.tag(), self.package_name);
        let line = format!("{} {}", self.tint(&head, Color::Red), message);
        self.emit(&line);
    }

    fn tag(&self) -> String {
        format!("[{}]", self.run_id)
    }

    /// Whether escapes are actually emitted also follows `colored`'s own
    /// switches (`NO_COLOR`, `CLICOLOR_FORCE`, tty detection).
    fn tint(&self, text: &str, color: Color) -> ColoredString {
        if self.color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn emit(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Logging is best-effort: a closed stdout must not fail the plugin.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("package_name", &self.package_name)
            .field("run_id", &self.run_id)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn logger(debug: bool, color: bool) -> (Logger, Capture) {
        let config = RunConfig {
            run_id: "run-1".into(),
            debug,
            ..RunConfig::default()
        };
        let capture = Capture::default();
        let mut logger = Logger::new("drift_check", &config).to_writer(capture.clone());
        if !color {
            logger = logger.without_color();
        }
        (logger, capture)
    }

    #[test]
    fn plain_levels() {
        let (logger, out) = logger(true, false);
        logger.log("hello");
        logger.debug("details");
        logger.warn("careful");
        logger.error("boom");
        assert_eq!(
            out.lines(),
            vec![
                "[run-1] (drift_check) hello",
                "[run-1] (drift_check) DEBUG details",
                "[run-1] (drift_check) WARN careful",
                "[run-1] (drift_check) ERROR boom",
            ]
        );
    }

    #[test]
    fn debug_suppressed_when_disabled() {
        let (logger, out) = logger(false, false);
        logger.debug("hidden");
        logger.log("shown");
        assert_eq!(out.lines(), vec!["[run-1] (drift_check) shown"]);
    }

    #[test]
    fn colored_output() {
        colored::control::set_override(true);
        let (logger, out) = logger(false, true);
        logger.log("hi");
        logger.error("bad");
        assert_eq!(
            out.lines(),
            vec![
                "\x1b[36m[run-1]\x1b[0m (drift_check) hi",
                "\x1b[31m[run-1] (drift_check) ERROR\x1b[0m bad",
            ]
        );
    }

    #[test]
    fn without_color_stays_plain_when_colors_are_forced() {
        colored::control::set_override(true);
        let (logger, out) = logger(false, false);
        logger.warn("careful");
        assert_eq!(out.lines(), vec!["[run-1] (drift_check) WARN careful"]);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn write_failures_are_dropped() {
        let logger = Logger::new("drift_check", &RunConfig::default()).to_writer(ClosedPipe);
        logger.log("nobody listens");
        logger.error("still fine");
    }

    #[test]
    fn clones_share_the_writer() {
        let (logger, out) = logger(false, false);
        let other = logger.clone();
        logger.log("a");
        other.log("b");
        assert_eq!(out.lines().len(), 2);
    }
}
