//! Key event sinks — where the scheduler sends press and release commands.
//!
//! Actual OS key injection lives outside this crate; anything that turns a
//! [`KeyEvent`] into real input implements [`KeySink`].

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::dsl::Key;

/// Modifier keys the scheduler may hold around a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
}

/// One command sent to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Press(Key),
    Release(Key),
    PressModifier(Modifier),
    ReleaseModifier(Modifier),
}

/// Receives key commands. Calls are synchronous and must not block for long.
pub trait KeySink: Send {
    fn press(&mut self, key: Key);
    fn release(&mut self, key: Key);
    fn press_modifier(&mut self, modifier: Modifier);
    fn release_modifier(&mut self, modifier: Modifier);
}

impl<S: KeySink + ?Sized> KeySink for Box<S> {
    fn press(&mut self, key: Key) {
        (**self).press(key);
    }

    fn release(&mut self, key: Key) {
        (**self).release(key);
    }

    fn press_modifier(&mut self, modifier: Modifier) {
        (**self).press_modifier(modifier);
    }

    fn release_modifier(&mut self, modifier: Modifier) {
        (**self).release_modifier(modifier);
    }
}

/// Writes every key event to the log. Used when no real input backend is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl KeySink for LogSink {
    fn press(&mut self, key: Key) {
        info!(key = %key, "press");
    }

    fn release(&mut self, key: Key) {
        info!(key = %key, "release");
    }

    fn press_modifier(&mut self, modifier: Modifier) {
        info!(modifier = ?modifier, "press");
    }

    fn release_modifier(&mut self, modifier: Modifier) {
        info!(modifier = ?modifier, "release");
    }
}

/// Records every event in memory.
///
/// Clones share one log, so a test can keep a handle while the player owns
/// the sink on another thread.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<KeyEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<KeyEvent> {
        self.lock().clone()
    }

    /// Keys pressed and not yet released, in press order.
    pub fn held_keys(&self) -> Vec<Key> {
        let mut held = Vec::new();
        for event in self.lock().iter() {
            match *event {
                KeyEvent::Press(key) => held.push(key),
                KeyEvent::Release(key) => {
                    if let Some(pos) = held.iter().position(|k| *k == key) {
                        held.remove(pos);
                    }
                }
                KeyEvent::PressModifier(_) | KeyEvent::ReleaseModifier(_) => {}
            }
        }
        held
    }

    /// Whether shift is currently held.
    pub fn shift_held(&self) -> bool {
        let mut depth = 0i32;
        for event in self.lock().iter() {
            match event {
                KeyEvent::PressModifier(Modifier::Shift) => depth += 1,
                KeyEvent::ReleaseModifier(Modifier::Shift) => depth -= 1,
                _ => {}
            }
        }
        depth > 0
    }

    /// Keys of each press, in order, ignoring releases and modifiers.
    pub fn pressed(&self) -> Vec<Key> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                KeyEvent::Press(key) => Some(*key),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<KeyEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeySink for RecordingSink {
    fn press(&mut self, key: Key) {
        self.lock().push(KeyEvent::Press(key));
    }

    fn release(&mut self, key: Key) {
        self.lock().push(KeyEvent::Release(key));
    }

    fn press_modifier(&mut self, modifier: Modifier) {
        self.lock().push(KeyEvent::PressModifier(modifier));
    }

    fn release_modifier(&mut self, modifier: Modifier) {
        self.lock().push(KeyEvent::ReleaseModifier(modifier));
    }
}
