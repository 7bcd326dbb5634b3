// src/config.rs
//
// Central configuration for the bridgebot control core.
// Single source of truth for the transport endpoint and timeouts,
// the decision-rule constants (target NPC, food set, waypoints),
// and the reward-shaping constants.
//
// Defaults match the reference agent's Lumbridge goblin task; all of
// them are plain data so a harness can retarget the agent without
// touching code.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Human-readable config / release version.
    pub version: &'static str,
    /// Transport client settings.
    pub transport: TransportConfig,
    /// Decision-engine rule constants.
    pub decision: DecisionConfig,
    /// Reward-shaping constants.
    pub reward: RewardConfig,
    /// Animation ids counted as "player is performing a combat action".
    pub combat_animation_ids: Vec<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "bridgebot-0.1.0",
            transport: TransportConfig::default(),
            decision: DecisionConfig::default(),
            reward: RewardConfig::default(),
            // Common melee/ranged/magic attack animations.
            combat_animation_ids: vec![422, 423, 390, 393, 386, 80, 819, 1658],
        }
    }
}

impl Config {
    /// Default config with the endpoint taken from `BRIDGEBOT_ENDPOINT`
    /// when set and non-empty.
    pub fn from_env() -> Self {
        let mut cfg = Config::default();
        if let Ok(endpoint) = std::env::var("BRIDGEBOT_ENDPOINT") {
            if !endpoint.is_empty() {
                cfg.transport.endpoint = endpoint;
            }
        }
        cfg
    }
}

/// Settings for the synchronous bridge transport client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// host:port of the bridge plugin's request/reply socket.
    pub endpoint: String,
    /// Bound on each connect attempt.
    pub connect_timeout: Duration,
    /// Bound on each request/reply round trip.
    pub request_timeout: Duration,
    /// A link with no successful round trip within this window is
    /// reported as unhealthy even if no call has errored.
    pub freshness_window: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:5555".to_string(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            freshness_window: Duration::from_secs(30),
        }
    }
}

/// Constants driving the rule-based decision engine.
#[derive(Debug, Clone)]
pub struct DecisionConfig {
    /// NPC id the attack rule scans for (125 = goblin).
    pub target_npc_id: i64,
    /// Inventory item ids the eat rule accepts as food
    /// (cooked shrimp, cooked chicken, bread).
    pub food_item_ids: Vec<i64>,
    /// Eat only when current/max health is at or below this fraction.
    pub eat_health_threshold: f64,
    /// Waypoint cycle for the move rule (x, y, plane).
    pub waypoints: Vec<(i64, i64, i64)>,
    /// Ground item id the pickup rule scans for (526 = bones).
    pub pickup_item_id: i64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            target_npc_id: 125,
            food_item_ids: vec![315, 2140, 2309],
            eat_health_threshold: 0.6,
            // East of the river, south of the castle.
            waypoints: vec![(3248, 3237, 0), (3252, 3230, 0), (3245, 3224, 0)],
            pickup_item_id: 526,
        }
    }
}

/// Reward-shaping constants.
///
/// Penalties are stored as positive magnitudes and subtracted; the two
/// override values (`noop_reward`, `death_penalty`) replace the running
/// total outright.
#[derive(Debug, Clone)]
pub struct RewardConfig {
    /// Cost applied at the start of every step.
    pub base_cost: f64,
    /// Subtracted when the action outcome is an error.
    pub error_penalty: f64,
    /// Attack chosen but no valid target in the snapshot.
    pub no_target_penalty: f64,
    /// Attack/eat/pickup chosen with an uninitialised player location.
    pub location_unavailable_penalty: f64,
    /// Eat chosen with no configured food in the inventory.
    pub no_food_penalty: f64,
    /// Eat chosen while health was above the threshold.
    pub health_sufficient_penalty: f64,
    /// Eat chosen while max health was zero or negative.
    pub invalid_max_health_penalty: f64,
    /// Pickup chosen but no matching ground item in the snapshot.
    pub no_pickup_penalty: f64,
    /// Caller passed an out-of-range action code.
    pub unknown_action_penalty: f64,
    /// Added for any successfully submitted action.
    pub submission_bonus: f64,
    /// Added on top of the submission bonus for a submitted attack.
    pub attack_bonus: f64,
    /// Per health point regained after a submitted eat.
    pub heal_bonus_per_hp: f64,
    /// Subtracted when a submitted eat produced no observed healing.
    pub eat_no_heal_penalty: f64,
    /// Added on top of the submission bonus for a submitted move.
    pub move_bonus: f64,
    /// Added on top of the submission bonus for a submitted pickup.
    pub pickup_bonus: f64,
    /// Flat reward for Noop, replacing all additive terms.
    pub noop_reward: f64,
    /// Terminal reward when the new snapshot shows the player dead.
    /// Overrides everything else.
    pub death_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_cost: -0.1,
            error_penalty: 0.5,
            no_target_penalty: 0.5,
            location_unavailable_penalty: 0.5,
            no_food_penalty: 0.3,
            health_sufficient_penalty: 0.3,
            invalid_max_health_penalty: 0.3,
            no_pickup_penalty: 0.3,
            unknown_action_penalty: 0.5,
            submission_bonus: 0.1,
            attack_bonus: 0.5,
            heal_bonus_per_hp: 0.5,
            eat_no_heal_penalty: 0.1,
            move_bonus: 0.05,
            pickup_bonus: 0.2,
            noop_reward: 0.0,
            death_penalty: -100.0,
        }
    }
}
