//! Odds data sources.
//!
//! This module handles:
//! - A simulated live-odds feed
//! - Loading and saving snapshot files

pub mod file;
pub mod simulator;

pub use file::{load_records, save_records};
pub use simulator::{OddsSimulator, BOOKMAKERS, EVENTS};
