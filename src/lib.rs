//! Line and roster builder for team coaches.
//!
//! The core is an assignment board mapping players onto the slots of a lineup,
//! with swap semantics, keyboard and drag placement, and a serializable state for
//! the host form. Around it sit the ordered roster selection, contrast-safe line
//! colors, CSV loading and export, and an actix-web host for the pages.

pub mod board;
pub mod colors;
pub mod config;
pub mod display;
pub mod form;
pub mod parser;
pub mod web;
