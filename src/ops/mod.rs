pub mod badge;
pub mod edge;
pub mod placement;
pub mod preview;
pub mod transfer;
