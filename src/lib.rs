//! Bridgebot core library.
//!
//! Control core for an autonomous game agent speaking to a bridge
//! plugin over a synchronous request/reply channel: transport client,
//! telemetry normalizer, rule-based decision engine, reward shaping,
//! and a Gym-style episode controller. The binary (`src/main.rs`) is
//! just a thin harness around these components.

pub mod config;
pub mod decision;
pub mod env;
pub mod logging;
pub mod metrics;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod telemetry;
pub mod transport;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{Config, DecisionConfig, RewardConfig, TransportConfig};

pub use decision::{Decision, DecisionEngine, DecisionReason};

pub use env::{GameEnv, StepInfo, StepResult};

pub use logging::{FileSink, NoopSink, StepSink};

pub use metrics::{MetricsSink, NoopMetrics, PromMetrics, StatsMetrics};

pub use observation::{
    is_combat_animation, normalize, Descriptors, GroundItemSlot, NpcSlot, PlayerLocation,
    PlayerStats, StateSnapshot, MAX_GROUND_ITEMS, MAX_INVENTORY_SLOTS, MAX_NEARBY_NPCS,
    SLOT_SENTINEL,
};

pub use policy::{CyclePolicy, HeuristicPolicy, Policy};

pub use telemetry::{RawTelemetry, TelemetryFrame};

pub use transport::{BridgeTransport, LinkState, TcpBridgeClient, TransportError};

pub use types::{ActionCode, ActionOutcome, ActionRequest, OutcomeStatus};
