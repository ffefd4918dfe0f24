//! Playback engine — runs a compiled script on a dedicated thread.
//!
//! The [`Scheduler`] does all the work; [`Player`] spawns it on its own
//! thread and hands back a [`PlaybackHandle`] for stopping it and collecting
//! the single completion result. The only state shared with the playback
//! thread is the [`CancelToken`].

pub mod cancel;
pub mod clock;
pub mod error;
pub mod scheduler;
pub mod sink;
pub mod state;

pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use scheduler::{KeyTiming, PlaybackOutcome, PlaybackStatus, Scheduler, Tick};
pub use sink::{KeyEvent, KeySink, LogSink, Modifier, RecordingSink};
pub use state::PlaybackState;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::PlayerConfig;
use crate::dsl::ScriptDocument;

/// The single result a playback session reports.
pub type PlaybackResult = Result<PlaybackOutcome, RuntimeError>;

/// Starts playback sessions with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Player {
    config: PlayerConfig,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Start playing on a new thread using the wall clock.
    pub fn start<S>(
        &self,
        document: Arc<ScriptDocument>,
        cancel: CancelToken,
        sink: S,
    ) -> PlaybackHandle
    where
        S: KeySink + 'static,
    {
        self.start_with_clock(document, cancel, sink, SystemClock::new())
    }

    /// Start playing on a new thread with an explicit time source.
    pub fn start_with_clock<S, C>(
        &self,
        document: Arc<ScriptDocument>,
        cancel: CancelToken,
        sink: S,
        clock: C,
    ) -> PlaybackHandle
    where
        S: KeySink + 'static,
        C: Clock + 'static,
    {
        self.spawn(document, cancel, sink, clock, |_| {})
    }

    /// Start playing and call `on_complete` exactly once when the session ends.
    ///
    /// If the sink panics, `on_complete` sees [`RuntimeErrorKind::SinkPanicked`]
    /// and the panic is then resumed on the playback thread.
    pub fn start_with_callback<S, F>(
        &self,
        document: Arc<ScriptDocument>,
        cancel: CancelToken,
        sink: S,
        on_complete: F,
    ) -> PlaybackHandle
    where
        S: KeySink + 'static,
        F: FnOnce(&PlaybackResult) + Send + 'static,
    {
        self.spawn(document, cancel, sink, SystemClock::new(), on_complete)
    }

    fn spawn<S, C, F>(
        &self,
        document: Arc<ScriptDocument>,
        cancel: CancelToken,
        sink: S,
        clock: C,
        on_complete: F,
    ) -> PlaybackHandle
    where
        S: KeySink + 'static,
        C: Clock + 'static,
        F: FnOnce(&PlaybackResult) + Send + 'static,
    {
        let config = self.config.clone();
        let thread_cancel = cancel.clone();
        let thread = thread::spawn(move || {
            let mut scheduler = Scheduler::new(document, sink, clock, thread_cancel, &config);
            match panic::catch_unwind(AssertUnwindSafe(|| scheduler.run())) {
                Ok(result) => {
                    on_complete(&result);
                    result
                }
                Err(payload) => {
                    let line = scheduler.current_line();
                    tracing::error!(line, "key sink panicked during playback");
                    on_complete(&Err(RuntimeError::new(line, RuntimeErrorKind::SinkPanicked)));
                    panic::resume_unwind(payload)
                }
            }
        });
        PlaybackHandle {
            cancel,
            thread: Some(thread),
        }
    }
}

/// Control handle for a running session.
///
/// Dropping the handle stops playback and waits for the thread to finish.
pub struct PlaybackHandle {
    cancel: CancelToken,
    thread: Option<JoinHandle<PlaybackResult>>,
}

impl PlaybackHandle {
    /// Request the session to stop at its next tick. Safe to call repeatedly
    /// or after the session has already ended.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        match &self.thread {
            Some(thread) => thread.is_finished(),
            None => true,
        }
    }

    /// Block until the session ends and return its result.
    ///
    /// A panic on the playback thread is resumed on the caller.
    pub fn wait(mut self) -> PlaybackResult {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(result)) => result,
            Some(Err(panic)) => std::panic::resume_unwind(panic),
            None => Ok(PlaybackOutcome::Stopped),
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.cancel.cancel();
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Compiler, Key};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn document(src: &str) -> Arc<ScriptDocument> {
        Arc::new(Compiler::compile(src).unwrap())
    }

    #[test]
    fn plays_to_completion_on_thread() {
        let sink = RecordingSink::new();
        let handle = Player::default().start_with_clock(
            document("ab"),
            CancelToken::new(),
            sink.clone(),
            ManualClock::new(),
        );
        assert_eq!(handle.wait().unwrap(), PlaybackOutcome::Finished);
        assert_eq!(sink.pressed(), vec![Key::new('a'), Key::new('b')]);
    }

    #[test]
    fn runtime_error_is_returned_from_wait() {
        let handle = Player::default().start_with_clock(
            document(",GOTO nowhere 1"),
            CancelToken::new(),
            RecordingSink::new(),
            ManualClock::new(),
        );
        let err = handle.wait().unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::UnknownTag("nowhere".into()));
    }

    #[test]
    fn stop_interrupts_long_rest() {
        let handle = Player::default().start(
            document(",BPM 1\n,WAIT 1000\na"),
            CancelToken::new(),
            RecordingSink::new(),
        );
        thread::sleep(Duration::from_millis(20));
        handle.stop();
        handle.stop();
        assert_eq!(handle.wait().unwrap(), PlaybackOutcome::Stopped);
    }

    #[test]
    fn callback_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = Player::default().start_with_callback(
            document("a"),
            CancelToken::new(),
            RecordingSink::new(),
            move |result| {
                assert!(result.is_ok());
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        let result = handle.wait();
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    struct PanickingSink;

    impl KeySink for PanickingSink {
        fn press(&mut self, _key: Key) {
            panic!("sink failure");
        }
        fn release(&mut self, _key: Key) {}
        fn press_modifier(&mut self, _modifier: Modifier) {}
        fn release_modifier(&mut self, _modifier: Modifier) {}
    }

    #[test]
    fn callback_reports_sink_panic_before_it_resumes() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let observed = Arc::clone(&seen);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = Player::default().start_with_callback(
            document(",BPM 90\nab"),
            CancelToken::new(),
            PanickingSink,
            move |result| {
                counter.fetch_add(1, Ordering::SeqCst);
                *observed.lock().unwrap() = Some(result.clone());
            },
        );
        let joined = panic::catch_unwind(AssertUnwindSafe(|| handle.wait()));
        assert!(joined.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            seen.lock().unwrap().take(),
            Some(Err(RuntimeError::new(2, RuntimeErrorKind::SinkPanicked)))
        );
    }

    #[test]
    fn external_token_cancels_session() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let sink = RecordingSink::new();
        let handle = Player::default().start(document("abc"), cancel, sink.clone());
        assert_eq!(handle.wait().unwrap(), PlaybackOutcome::Stopped);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn dropping_handle_stops_playback() {
        let sink = RecordingSink::new();
        let handle = Player::default().start(
            document(",BPM 1\na b c"),
            CancelToken::new(),
            sink.clone(),
        );
        drop(handle);
        assert!(sink.held_keys().is_empty());
        assert!(sink.pressed().len() <= 1);
    }
}
