//! Flutter bridge surface of the note editor engine.

pub mod api;
