//! Pipeline stages for card export.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the packer or download target can be swapped without touching
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ validate ──▶ assemble ──▶ pack ──▶ download
//! (photo)    (marks)      (tree)       (docx)   (file)
//!              │            │
//!              └── encode ◀─┘  (photo → PNG, per card)
//! ```
//!
//! 1. [`ingest`]   — read a selected photo into an encoded, self-describing form
//! 2. [`validate`] — mark missing fields on every card; overall pass/fail
//! 3. [`assemble`] — build the content tree and apply the break policy;
//!    uses [`encode`] for each photo and isolates per-card image failures
//! 4. [`pack`]     — serialise the tree to `.docx`; runs in `spawn_blocking`
//! 5. [`download`] — hand the bytes over under the configured file name

pub mod assemble;
pub mod download;
pub mod encode;
pub mod ingest;
pub mod pack;
pub mod validate;
