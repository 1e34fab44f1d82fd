//! Console Event Sink
//!
//! Human-readable progress on stderr. Stdout stays free for the launched
//! process and for command output.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::ports::{BuildEvent, EventSink, UnitEvent};

/// Event sink printing one line per event
pub struct ConsoleEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
    decorated: bool,
    verbose: bool,
}

impl ConsoleEventSink {
    /// `decorated` adds ANSI colors; `verbose` shows every stage start
    /// and unit transition.
    pub fn with_writer<W: Write + Send + 'static>(writer: W, decorated: bool, verbose: bool) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            decorated,
            verbose,
        }
    }

    fn line(&self, marker: &str, color: &str, text: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            if self.decorated {
                let _ = writeln!(writer, "\x1b[{}m{}\x1b[0m {}", color, marker, text);
            } else {
                let _ = writeln!(writer, "{} {}", marker, text);
            }
            let _ = writer.flush();
        }
    }
}

impl EventSink for ConsoleEventSink {
    fn on_build(&self, event: BuildEvent) {
        match event {
            BuildEvent::Started { context, tag } => {
                self.line("==>", "1", &format!("Building {} from {}", tag, context.display()));
            }
            BuildEvent::StageStarted { stage, key } => {
                if self.verbose {
                    self.line(" ->", "2", &format!("{:<12} {}", stage, key.short()));
                }
            }
            BuildEvent::StageCached { stage, key } => {
                self.line(" ✓", "32", &format!("{:<12} cached ({})", stage, key.short()));
            }
            BuildEvent::StageCompleted { stage, key, detail } => {
                let detail = detail.map(|d| format!(", {}", d)).unwrap_or_default();
                self.line(
                    " ✓",
                    "32",
                    &format!("{:<12} done ({}{})", stage, key.short(), detail),
                );
            }
            BuildEvent::StageFailed { stage, error } => {
                self.line(" ✗", "31", &format!("{:<12} {}", stage, error));
            }
            BuildEvent::Warning { message } => {
                self.line(" !", "33", &message);
            }
            BuildEvent::Completed { tag, digest } => {
                self.line("==>", "1", &format!("Built {} ({})", tag, digest.short()));
            }
        }
    }

    fn on_unit(&self, event: UnitEvent) {
        match event {
            UnitEvent::Transition { image, from, to } => {
                if self.verbose || to.is_terminal() {
                    self.line("==>", "1", &format!("{}: {} -> {}", image, from, to));
                }
            }
        }
    }

    fn wants_detailed_events(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UnitState;
    use crate::domain::value_objects::{ContentHash, Stage};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        let buffer = Buffer::default();
        let sink = ConsoleEventSink::with_writer(buffer.clone(), false, false);
        sink.on_build(BuildEvent::StageCached {
            stage: Stage::Dependencies,
            key: ContentHash::new("0123456789abcdef"),
        });
        assert_eq!(buffer.text(), " ✓ dependencies cached (0123456789ab)\n");
    }

    #[test]
    fn quiet_mode_hides_intermediate_transitions() {
        let buffer = Buffer::default();
        let sink = ConsoleEventSink::with_writer(buffer.clone(), false, false);
        sink.on_unit(UnitEvent::Transition {
            image: "bot".to_string(),
            from: UnitState::Created,
            to: UnitState::Starting,
        });
        sink.on_unit(UnitEvent::Transition {
            image: "bot".to_string(),
            from: UnitState::Running { pid: 1 },
            to: UnitState::Exited { code: 0 },
        });
        assert_eq!(buffer.text(), "==> bot: RUNNING -> EXITED(0)\n");
    }
}
