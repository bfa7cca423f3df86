//! Reusable widgets shared by the wizard screens.

pub mod choice;
pub mod field;
