//! Tick-driven playback of a [`ScriptDocument`].
//!
//! One [`Scheduler`] owns one [`PlaybackState`] and steps a cursor through the
//! document. Each call to [`Scheduler::tick`] does at most one unit of work:
//! sit out one rest beat, strike one action's chords, or apply one directive.
//! Cancellation is checked at the start of every tick and between the chords
//! of one action, so a chord that has started always finishes its releases
//! first.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::config::PlayerConfig;
use crate::dsl::{Action, Chord, Directive, DirectiveKind, Key, ScriptDocument};

use super::cancel::CancelToken;
use super::clock::Clock;
use super::error::{RuntimeError, RuntimeErrorKind};
use super::sink::{KeySink, Modifier};
use super::state::PlaybackState;

/// Lifecycle of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Running,
    /// Ran past the last action or hit `STOP`.
    Finished,
    /// Cancelled from outside.
    Stopped,
    Failed,
}

/// How a successful session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Stopped,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Done(PlaybackOutcome),
}

/// Where the cursor goes after a directive.
enum Flow {
    Next,
    Jump(usize),
    Stop,
}

/// Key press timing within a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTiming {
    /// How long a chord is held before release.
    pub hold: Duration,
    /// Gap between successive key-downs in one chord.
    pub stagger: Duration,
}

impl From<&PlayerConfig> for KeyTiming {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            hold: config.key_hold(),
            stagger: config.key_stagger(),
        }
    }
}

pub struct Scheduler<S, C> {
    document: Arc<ScriptDocument>,
    state: PlaybackState,
    sink: S,
    clock: C,
    cancel: CancelToken,
    timing: KeyTiming,
    status: PlaybackStatus,
    completion: Option<Result<PlaybackOutcome, RuntimeError>>,
}

impl<S: KeySink, C: Clock> Scheduler<S, C> {
    pub fn new(
        document: Arc<ScriptDocument>,
        sink: S,
        clock: C,
        cancel: CancelToken,
        config: &PlayerConfig,
    ) -> Self {
        Self {
            document,
            state: PlaybackState::new(config.tempo()),
            sink,
            clock,
            cancel,
            timing: KeyTiming::from(config),
            status: PlaybackStatus::Idle,
            completion: None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Source line of the action under the cursor, or 0 past the end.
    pub fn current_line(&self) -> usize {
        self.document.get(self.state.cursor).map_or(0, Action::line)
    }

    /// Run ticks until the session ends.
    pub fn run(&mut self) -> Result<PlaybackOutcome, RuntimeError> {
        info!(actions = self.document.len(), bpm = self.state.tempo_bpm, "playback started");
        loop {
            if let Tick::Done(outcome) = self.tick()? {
                return Ok(outcome);
            }
        }
    }

    /// Advance playback by one step.
    ///
    /// Once the session has ended, every further call returns the same
    /// result and does nothing else.
    pub fn tick(&mut self) -> Result<Tick, RuntimeError> {
        if let Some(completion) = &self.completion {
            return completion.clone().map(Tick::Done);
        }
        self.status = PlaybackStatus::Running;

        if self.cancel.is_cancelled() {
            return self.complete(Ok(PlaybackOutcome::Stopped));
        }
        let document = Arc::clone(&self.document);
        let Some(action) = document.get(self.state.cursor) else {
            return self.complete(Ok(PlaybackOutcome::Finished));
        };

        let started = self.clock.now();
        if self.state.rest_remaining > 0 {
            self.state.rest_remaining -= 1;
            self.wait_beat(started);
            return Ok(Tick::Continue);
        }

        match action {
            Action::NoteChord { chords, .. } => {
                for (i, chord) in chords.iter().enumerate() {
                    if i > 0 && self.cancel.is_cancelled() {
                        return self.complete(Ok(PlaybackOutcome::Stopped));
                    }
                    let chord_started = if i == 0 { started } else { self.clock.now() };
                    self.strike(chord);
                    self.wait_beat(chord_started);
                }
                self.state.cursor += 1;
            }
            Action::Directive(directive) => match self.dispatch(directive) {
                Ok(Flow::Next) => self.state.cursor += 1,
                Ok(Flow::Jump(index)) => self.state.cursor = index,
                Ok(Flow::Stop) => return self.complete(Ok(PlaybackOutcome::Finished)),
                Err(err) => return self.complete(Err(err)),
            },
        }
        Ok(Tick::Continue)
    }

    fn complete(
        &mut self,
        result: Result<PlaybackOutcome, RuntimeError>,
    ) -> Result<Tick, RuntimeError> {
        self.status = match &result {
            Ok(PlaybackOutcome::Finished) => PlaybackStatus::Finished,
            Ok(PlaybackOutcome::Stopped) => PlaybackStatus::Stopped,
            Err(_) => PlaybackStatus::Failed,
        };
        match &result {
            Ok(outcome) => info!(?outcome, cursor = self.state.cursor, "playback ended"),
            Err(err) => info!(%err, "playback failed"),
        }
        self.completion = Some(result.clone());
        result.map(Tick::Done)
    }

    /// Press a chord, hold it, release it.
    fn strike(&mut self, chord: &Chord) {
        let mut held = HeldKeys::new(&mut self.sink);
        if chord.is_upper() {
            held.press_shift();
        }
        for (i, key) in chord.keys().iter().enumerate() {
            if i > 0 {
                self.clock.sleep(self.timing.stagger);
            }
            held.press(*key);
        }
        self.clock.sleep(self.timing.hold);
        held.release_all();
    }

    /// Sleep out whatever is left of the beat that began at `started`.
    fn wait_beat(&self, started: Duration) {
        let interval = self.state.beat_interval();
        let elapsed = self.clock.now().saturating_sub(started);
        if let Some(remaining) = interval.checked_sub(elapsed).filter(|d| !d.is_zero()) {
            self.clock.sleep_unless_cancelled(remaining, &self.cancel);
        }
    }

    fn dispatch(&mut self, directive: &Directive) -> Result<Flow, RuntimeError> {
        debug!(line = directive.line, kind = %directive.kind, args = ?directive.args, "directive");
        match directive.kind {
            DirectiveKind::Bpm => {
                let bpm = integer_arg(directive, 0)?;
                self.state.tempo_bpm = u32::try_from(bpm)
                    .ok()
                    .filter(|bpm| *bpm > 0)
                    .ok_or_else(|| {
                        RuntimeError::new(directive.line, RuntimeErrorKind::InvalidTempo)
                    })?;
                Ok(Flow::Next)
            }
            DirectiveKind::Wait => {
                // Negative counts rest for nothing.
                let beats = integer_arg(directive, 0)?.max(0);
                self.state.rest_remaining = u32::try_from(beats).unwrap_or(u32::MAX);
                Ok(Flow::Next)
            }
            DirectiveKind::Stop => Ok(Flow::Stop),
            DirectiveKind::Tag | DirectiveKind::Set => Ok(Flow::Next),
            DirectiveKind::Goto => {
                let name = string_arg(directive, 0)?;
                let bound = integer_arg(directive, 1)?;
                let target = self.document.tag(name).ok_or_else(|| {
                    RuntimeError::new(directive.line, RuntimeErrorKind::UnknownTag(name.into()))
                })?;
                let count = self.state.goto_counts.entry(directive.line).or_insert(0);
                if i64::from(*count) < bound {
                    *count += 1;
                    debug!(tag = name, repeat = *count, bound, "jump");
                    Ok(Flow::Jump(target))
                } else {
                    Ok(Flow::Next)
                }
            }
        }
    }
}

fn string_arg(directive: &Directive, position: usize) -> Result<&str, RuntimeError> {
    directive.arg(position).ok_or_else(|| {
        RuntimeError::new(
            directive.line,
            RuntimeErrorKind::MissingArgument {
                directive: directive.kind,
                position,
            },
        )
    })
}

fn integer_arg(directive: &Directive, position: usize) -> Result<i64, RuntimeError> {
    let value = string_arg(directive, position)?;
    value.parse().map_err(|_| {
        RuntimeError::new(
            directive.line,
            RuntimeErrorKind::InvalidInteger {
                directive: directive.kind,
                value: value.to_string(),
            },
        )
    })
}

/// Keys currently held by one chord. Whatever is still held when this is
/// dropped gets released, so an unwinding sink call never leaves keys down.
struct HeldKeys<'a, S: KeySink> {
    sink: &'a mut S,
    keys: Vec<Key>,
    shift: bool,
}

impl<'a, S: KeySink> HeldKeys<'a, S> {
    fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            keys: Vec::new(),
            shift: false,
        }
    }

    fn press_shift(&mut self) {
        trace!("shift down");
        self.shift = true;
        self.sink.press_modifier(Modifier::Shift);
    }

    fn press(&mut self, key: Key) {
        trace!(key = %key, "key down");
        self.keys.push(key);
        self.sink.press(key);
    }

    fn release_all(&mut self) {
        for key in self.keys.drain(..) {
            trace!(key = %key, "key up");
            self.sink.release(key);
        }
        if std::mem::take(&mut self.shift) {
            trace!("shift up");
            self.sink.release_modifier(Modifier::Shift);
        }
    }
}

impl<S: KeySink> Drop for HeldKeys<'_, S> {
    fn drop(&mut self) {
        self.release_all();
    }
}
