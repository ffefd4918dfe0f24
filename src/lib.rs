//! keyroll — a script-driven virtual piano player.
//!
//! Scripts are compiled by [`dsl::Compiler`] into a [`dsl::ScriptDocument`],
//! which a [`player::Player`] plays back as timed key presses.

pub mod config;
pub mod dsl;
pub mod player;
