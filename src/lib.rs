pub mod adapters;
pub mod announce;
pub mod cli;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod services;

pub use adapters::{DeliveryRef, DeliverySink, Post};
pub use config::AppConfig;
pub use coordination::{ShutdownHandle, ShutdownSignal};
pub use domain::{EventKind, Game, GameState, Play};
pub use engine::{CycleReport, EngineConfig, EventCache, FinalizeStatus, ReconciliationEngine};
pub use error::{BotError, Result};
pub use feed::{PlayByPlayDocument, SnapshotFetcher};
pub use services::{GameLoop, LoopOutcome, LoopSettings};
