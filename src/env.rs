// src/env.rs
//
// Gym-style episode controller.
//
// Ties the transport client, normalizer, decision engine, and reward
// calculator into a reset/step loop. Generic over the transport so
// tests drive it with a scripted bridge.
//
// Step order is fixed: decode the action code, decide, submit when a
// request was produced, fetch a fresh snapshot, score, then check
// termination against the new snapshot. A step never fails; every
// fault on the way is folded into the outcome and reward.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::decision::{DecisionEngine, DecisionReason};
use crate::logging::StepSink;
use crate::observation::{is_combat_animation, normalize, Descriptors, StateSnapshot};
use crate::reward::compute_reward;
use crate::transport::BridgeTransport;
use crate::types::{ActionCode, ActionOutcome};

/// Side-channel diagnostics for one step or reset.
#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    /// Untouched reply payload of the observation fetch.
    pub raw_observation: JsonValue,
    pub npc_names: Vec<String>,
    pub inventory_item_names: Vec<String>,
    pub ground_item_names: Vec<String>,
    pub action_outcome: ActionOutcome,
    pub decision_reason: String,
    pub in_combat: bool,
    pub cumulative_reward: f64,
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub observation: StateSnapshot,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

pub struct GameEnv<T: BridgeTransport> {
    transport: T,
    engine: DecisionEngine,
    cfg: Config,
    sink: Box<dyn StepSink>,
    last_snapshot: StateSnapshot,
    last_names: Descriptors,
    last_raw: JsonValue,
    in_combat: bool,
    cumulative_reward: f64,
    done: bool,
    episode: u64,
    tick: u64,
}

impl<T: BridgeTransport> GameEnv<T> {
    pub fn new(cfg: Config, transport: T) -> Self {
        let engine = DecisionEngine::new(cfg.decision.clone());
        Self {
            transport,
            engine,
            cfg,
            sink: Box::new(crate::logging::NoopSink),
            last_snapshot: StateSnapshot::default(),
            last_names: Descriptors::default(),
            last_raw: JsonValue::Null,
            in_combat: false,
            cumulative_reward: 0.0,
            done: false,
            episode: 0,
            tick: 0,
        }
    }

    /// Attach a step sink. Replaces the default no-op sink.
    pub fn with_sink(mut self, sink: Box<dyn StepSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    /// Begin a new episode: clear per-episode state and fetch the
    /// initial snapshot. A transport fault yields the default snapshot.
    pub fn reset(&mut self) -> (StateSnapshot, StepInfo) {
        self.engine.reset();
        self.cumulative_reward = 0.0;
        self.done = false;
        self.episode += 1;
        self.tick = 0;

        self.observe();
        self.sink.log_reset(self.episode, &self.last_snapshot);

        let info = self.build_info(ActionOutcome::no_action(), "reset");
        (self.last_snapshot, info)
    }

    /// Advance one tick with a caller-supplied discrete action code.
    pub fn step(&mut self, action: i64) -> StepResult {
        if self.done {
            // Terminal absorbing state: replay the last snapshot.
            let info = self.build_info(ActionOutcome::no_action(), "episode_over");
            return StepResult {
                observation: self.last_snapshot,
                reward: 0.0,
                terminated: true,
                truncated: false,
                info,
            };
        }

        self.tick += 1;
        let prev = self.last_snapshot;

        let code = ActionCode::from_index(action);
        let (reason, outcome) = match code {
            None => (DecisionReason::UnknownAction, ActionOutcome::no_action()),
            Some(code) => {
                let decision = self.engine.decide(code, &prev);
                let outcome = match &decision.request {
                    Some(request) => self.transport.submit_action(request),
                    None => ActionOutcome::no_action(),
                };
                (decision.reason, outcome)
            }
        };

        self.observe();
        let reward = compute_reward(
            &self.cfg.reward,
            code,
            &reason,
            &prev,
            &self.last_snapshot,
            &outcome,
        );
        self.cumulative_reward += reward;

        let terminated = self.last_snapshot.stats.current_health <= 0.0;
        self.done = terminated;

        self.sink.log_step(
            self.episode,
            self.tick,
            code,
            reason.label(),
            &outcome,
            reward,
            &self.last_snapshot,
        );

        let info = self.build_info(outcome, reason.label());
        StepResult {
            observation: self.last_snapshot,
            reward,
            terminated,
            truncated: false,
            info,
        }
    }

    /// Release the transport connection.
    pub fn close(&mut self) {
        self.transport.close();
    }

    /// Fetch and normalize one snapshot, updating the cached state.
    fn observe(&mut self) {
        let frame = self.transport.fetch_snapshot();
        let (snapshot, names) = normalize(&frame);
        self.in_combat = is_combat_animation(snapshot.animation, &self.cfg.combat_animation_ids);
        self.last_raw = frame.raw;
        self.last_snapshot = snapshot;
        self.last_names = names;
    }

    fn build_info(&self, outcome: ActionOutcome, reason: &str) -> StepInfo {
        StepInfo {
            raw_observation: self.last_raw.clone(),
            npc_names: self.last_names.npc_names.clone(),
            inventory_item_names: self.last_names.inventory_names.clone(),
            ground_item_names: self.last_names.ground_item_names.clone(),
            action_outcome: outcome,
            decision_reason: reason.to_string(),
            in_combat: self.in_combat,
            cumulative_reward: self.cumulative_reward,
        }
    }
}
