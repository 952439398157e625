//! Libris application library: the project modules mounted on the libris
//! kernel.

pub mod modules;
