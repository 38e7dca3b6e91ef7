//! # Program.A Poster Core
//!
//! Deterministic model behind the generative poster editors.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 poster-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Seed            │  Parameters              │
//! │  - text hashing  │  - per-editor controls   │
//! │  - Mulberry32    │  - clamping              │
//! │  - value noise   │  - render snapshots      │
//! ├─────────────────────────────────────────────┤
//! │  Artifacts       │  Store                   │
//! │  - upload model  │  - retained-count cap    │
//! │  - seed labels   │  - JSON persistence      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! A render is a pure function of a [`RenderSnapshot`] and the output size:
//! the same seed and parameters always yield the same poster.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod artifact;
pub mod error;
pub mod noise;
pub mod params;
pub mod query;
pub mod seed;
pub mod store;
pub mod stream;

pub use artifact::{current_timestamp_ms, NewPoster, PosterArtifact, PosterId, SeedLabel};
pub use error::{CoreError, CoreResult};
pub use noise::ValueNoise;
pub use params::{
    Composition, CrashClockParams, EditorKind, GriglieParams, LightPattern, LineColor,
    LuceParams, MoireColorMode, MoireParams, MouseMode, PatternParams, PixelParams,
    RenderSnapshot, RombiParams, SandColorMode, SandParams, ScatterParams, ShapeType, Tone,
};
pub use query::{editor_seed_from_url, seed_from_str, seed_from_url, url_with_seed};
pub use seed::{seed_from_text, Seed, SeedRule, DEFAULT_SEED};
pub use store::{PosterStore, StoreError};
pub use stream::RandomStream;

/// Poster core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
