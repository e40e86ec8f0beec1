//! Normalizes posts served by the xcancel.com mirror.
//!
//! Feeds in Atom, RSS 2.0 or RSS 1.0 form are decoded by [`feed`] and turned
//! into [`normalize::NormalizedItem`] records by [`normalize`].

pub mod config;
pub mod feed;
pub mod normalize;
