use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use anyhow::Result;
use berth::application::RunOptions;
use berth::domain::entities::UnitState;
use berth::domain::ports::{BuildEvent, EventSink, UnitEvent};
use berth::domain::value_objects::ImageTag;
use berth::presentation::factory::{self, EventTarget};
use berth::presentation::output::render_run;

use super::{report_error, CommandContext};

pub fn cmd_run(ctx: &CommandContext, tag: &str) -> Result<i32> {
    let tag = ImageTag::parse(tag)?;

    // SIGINT, SIGTERM and SIGHUP no longer end berth; the unit is asked to
    // stop and berth reports how it ended.
    let relay = Arc::new(SignalRelay::default());
    let handler_relay = Arc::clone(&relay);
    if let Err(e) = ctrlc::set_handler(move || handler_relay.request_stop()) {
        tracing::warn!(error = %e, "could not install termination handler");
    }

    let target = if ctx.json() {
        EventTarget::JsonStderr
    } else {
        EventTarget::Console
    };
    let sink: Arc<dyn EventSink> = Arc::new(RelaySink {
        inner: factory::create_event_sink(target, &ctx.settings, ctx.verbose),
        relay,
    });
    let use_case = factory::create_run_use_case(&ctx.settings);

    match use_case.execute_with_events(&RunOptions::new(tag), sink) {
        Ok(outcome) => {
            render_run(&mut std::io::stderr().lock(), &outcome, ctx.format)?;
            Ok(outcome.exit_code)
        }
        Err(failure) => {
            report_error(ctx.format, None, &failure.error, &failure.to_string());
            Ok(failure.unit.exit_code(None).unwrap_or(1))
        }
    }
}

/// Hands termination requests on to the unit's process.
///
/// The pid is known once the unit is RUNNING and forgotten once it reaches a
/// terminal state. A request that arrives before the process exists is
/// delivered as soon as it does.
#[derive(Debug, Default)]
struct SignalRelay {
    child: AtomicI32,
    requested: AtomicBool,
}

impl SignalRelay {
    fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.forward(self.child.load(Ordering::SeqCst));
    }

    fn track(&self, state: &UnitState) {
        match state {
            UnitState::Running { pid } => {
                let pid = i32::try_from(*pid).unwrap_or(0);
                self.child.store(pid, Ordering::SeqCst);
                if self.requested.load(Ordering::SeqCst) {
                    self.forward(pid);
                }
            }
            state if state.is_terminal() => self.child.store(0, Ordering::SeqCst),
            _ => {}
        }
    }

    fn forward(&self, pid: i32) {
        if pid > 0 {
            tracing::info!(pid, "forwarding SIGTERM to unit");
            terminate(pid);
        }
    }
}

#[cfg(unix)]
fn terminate(pid: i32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        tracing::warn!(pid, error = %e, "could not signal unit");
    }
}

#[cfg(not(unix))]
fn terminate(pid: i32) {
    tracing::warn!(pid, "signal forwarding is not supported on this platform");
}

/// Event sink that feeds unit transitions to the relay.
struct RelaySink {
    inner: Arc<dyn EventSink>,
    relay: Arc<SignalRelay>,
}

impl EventSink for RelaySink {
    fn on_build(&self, event: BuildEvent) {
        self.inner.on_build(event);
    }

    fn on_unit(&self, event: UnitEvent) {
        let UnitEvent::Transition { to, .. } = &event;
        self.relay.track(to);
        self.inner.on_unit(event);
    }

    fn wants_detailed_events(&self) -> bool {
        self.inner.wants_detailed_events()
    }
}
