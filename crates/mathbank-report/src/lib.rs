//! Rendering of mathbank audit reports for people and for CI tooling.

pub mod html;
pub mod sarif;
