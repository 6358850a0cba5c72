//! Binary-local application orchestration.
//!
//! `main.rs` parses arguments and hands off to [`entry::run`]; the one-shot
//! and interactive modes share the turn driver in [`tasks`].

pub(crate) mod approval;
pub(crate) mod commands;
pub(crate) mod entry;
pub(crate) mod exec_mode;
pub(crate) mod repl_loop;
pub(crate) mod startup;
pub(crate) mod tasks;
