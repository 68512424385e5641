//! A client for the shooter.cn subtitle service.
//! Subtitles are looked up by the content of a film file rather than by its name, so
//! renamed or re-muxed copies of the same release still find their subtitles.
//!
//! Flow:
//! 1. [`compute_fingerprint`] samples four fixed blocks of the film and hashes them.
//! 2. [`ShooterClient::query`] sends that fingerprint (plus the film's file name) to the service
//!    and gets back a flat list of [`SubtitleCandidate`]s.
//! 3. [`ShooterClient::fetch_all`] downloads every candidate concurrently and saves each one
//!    next to the others without ever overwriting a file that is already there.
//!
//! One failing download doesn't affect the others: the returned [`BatchReport`] has exactly one
//! entry per candidate, successful or not.

mod batch;
mod candidate;
mod client;
mod config;
mod error;
mod fetch;
mod filename;
mod fingerprint;
mod save;

pub use batch::{BatchReport, FetchResult};
pub use candidate::SubtitleCandidate;
pub use client::ShooterClient;
pub use config::ShooterConfig;
pub use error::{Error, Result};
pub use fetch::FetchedContent;
pub use fingerprint::{BLOCK_SIZE, Fingerprint, MIN_FILE_SIZE, compute_fingerprint, sample_offsets};
pub use save::CollisionSafeWriter;
