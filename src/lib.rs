//! Ironsight - Strength estimation and credibility engine
//!
//! Ironsight turns a fitness-dashboard snapshot into per-exercise strength
//! analytics through a deterministic pipeline: set aggregation → outlier
//! screening → credibility blending → trend and projection → standards
//! classification → report encoding.
//!
//! ## Modules
//!
//! - **Strength engine**: `aggregator`, `outliers`, `credibility`, `trend`, `standards`
//! - **Inputs**: `snapshot`, `catalog`, `bodyweight`, `config`
//! - **Outputs**: `types`, `encoder`, `overview`
//! - **Entry points**: `pipeline`, `ffi`

pub mod aggregator;
pub mod bodyweight;
pub mod catalog;
pub mod config;
pub mod credibility;
pub mod encoder;
pub mod error;
pub mod outliers;
pub mod overview;
pub mod pipeline;
pub mod snapshot;
pub mod standards;
pub mod stats;
pub mod trend;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::AnalyticsError;
pub use pipeline::{analyze_snapshot, analyze_snapshot_with_config, Analysis, StrengthProcessor};
pub use snapshot::Snapshot;
pub use types::{ExerciseReport, StrengthReport};

// Engine exports
pub use catalog::{classify_exercise, EquipmentClass, ExerciseTag, LiftCategory};
pub use credibility::CredibilityRecord;
pub use standards::{classify_lift, standards_for_bodyweight, Tier, TierThresholds};
pub use trend::{TrendBasis, TrendClass};

/// Ironsight version embedded in every report
pub const IRONSIGHT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "ironsight";
