//! Core of a sticky-notes overlay: placing new notes without overlap, and
//! keeping every running instance's copy of the notes consistent through a
//! shared key-value store.

pub mod cli;
pub mod io;
pub mod logging;
pub mod model;
pub mod ops;
pub mod sync;
pub mod util;
