// src/decision.rs
//
// Rule-based mapping from (action code, latest snapshot) to a concrete
// action request.
//
// The engine is deterministic and synchronous: each rule inspects the
// snapshot it is given and either produces a fully-parameterised
// `ActionRequest` or declines with a reason. It performs no I/O and
// holds only two pieces of state across ticks, the current attack
// target and the waypoint cursor, both cleared on episode reset.

use crate::config::DecisionConfig;
use crate::observation::StateSnapshot;
use crate::types::{ActionCode, ActionRequest};

/// Why the engine produced (or declined to produce) a request.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionReason {
    /// Attack rule found a target; request carries its npc id.
    TargetAcquired { npc_id: i64, dist_sq: f64 },
    /// Attack rule found no matching NPC with a usable position.
    NoTargetFound,
    /// A position-dependent rule ran with an uninitialised location.
    LocationUnavailable,
    /// Eat rule found food and health was low enough.
    EatingFood { item_id: i64 },
    /// Eat rule found none of the configured food items.
    NoFoodFound,
    /// Eat rule declined because health was above the threshold.
    HealthSufficient,
    /// Eat rule declined because max health was zero or negative.
    InvalidMaxHealth,
    /// Move rule emitted the waypoint at the cursor.
    MovingToWaypoint { x: i64, y: i64, plane: i64 },
    /// Move rule ran with an empty waypoint list.
    NoWaypoints,
    /// Pickup rule found a matching ground item.
    PickupTarget { item_id: i64, x: i64, y: i64 },
    /// Pickup rule found no matching ground item.
    NoPickupFound,
    /// Noop requested; nothing is ever sent.
    Noop,
    /// Caller passed an out-of-range action code.
    UnknownAction,
}

impl DecisionReason {
    /// Stable label for logs and step info.
    pub fn label(&self) -> &'static str {
        match self {
            DecisionReason::TargetAcquired { .. } => "target_acquired",
            DecisionReason::NoTargetFound => "no_target_found",
            DecisionReason::LocationUnavailable => "location_unavailable",
            DecisionReason::EatingFood { .. } => "eating_food",
            DecisionReason::NoFoodFound => "no_food_found",
            DecisionReason::HealthSufficient => "health_sufficient",
            DecisionReason::InvalidMaxHealth => "invalid_max_health",
            DecisionReason::MovingToWaypoint { .. } => "moving_to_waypoint",
            DecisionReason::NoWaypoints => "no_waypoints",
            DecisionReason::PickupTarget { .. } => "pickup_target",
            DecisionReason::NoPickupFound => "no_pickup_found",
            DecisionReason::Noop => "noop",
            DecisionReason::UnknownAction => "unknown_action",
        }
    }
}

/// Output of one decision: the request to submit, if any, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub request: Option<ActionRequest>,
    pub reason: DecisionReason,
}

impl Decision {
    fn act(request: ActionRequest, reason: DecisionReason) -> Self {
        Self {
            request: Some(request),
            reason,
        }
    }

    fn decline(reason: DecisionReason) -> Self {
        Self {
            request: None,
            reason,
        }
    }
}

/// Deterministic rule engine.
pub struct DecisionEngine {
    cfg: DecisionConfig,
    current_target: Option<i64>,
    waypoint_cursor: usize,
}

impl DecisionEngine {
    pub fn new(cfg: DecisionConfig) -> Self {
        Self {
            cfg,
            current_target: None,
            waypoint_cursor: 0,
        }
    }

    /// The npc id of the target picked by the last attack decision.
    pub fn current_target(&self) -> Option<i64> {
        self.current_target
    }

    /// Clear per-episode state. Called on environment reset.
    pub fn reset(&mut self) {
        self.current_target = None;
        self.waypoint_cursor = 0;
    }

    /// Map one action code to a concrete request against the snapshot.
    pub fn decide(&mut self, code: ActionCode, snapshot: &StateSnapshot) -> Decision {
        match code {
            ActionCode::AttackNpc => self.decide_attack(snapshot),
            ActionCode::EatFood => self.decide_eat(snapshot),
            ActionCode::MoveToWaypoint => self.decide_move(),
            ActionCode::Noop => Decision::decline(DecisionReason::Noop),
            ActionCode::PickupItem => self.decide_pickup(snapshot),
        }
    }

    /// Attack the nearest NPC whose id matches the configured target.
    /// Ties on distance keep the first-encountered slot.
    fn decide_attack(&mut self, snapshot: &StateSnapshot) -> Decision {
        if !snapshot.location.is_initialised() {
            self.current_target = None;
            return Decision::decline(DecisionReason::LocationUnavailable);
        }

        let mut best: Option<(i64, f64)> = None;
        for npc in &snapshot.npcs {
            if npc.id != self.cfg.target_npc_id || !npc.has_position() {
                continue;
            }
            let dist_sq = squared_distance(snapshot, npc.x, npc.y);
            match best {
                Some((_, best_sq)) if dist_sq >= best_sq => {}
                _ => best = Some((npc.id, dist_sq)),
            }
        }

        match best {
            Some((npc_id, dist_sq)) => {
                self.current_target = Some(npc_id);
                Decision::act(
                    ActionRequest::attack_npc(npc_id),
                    DecisionReason::TargetAcquired { npc_id, dist_sq },
                )
            }
            None => {
                self.current_target = None;
                Decision::decline(DecisionReason::NoTargetFound)
            }
        }
    }

    /// Eat the first configured food item, but only when health is at
    /// or below the threshold fraction.
    fn decide_eat(&mut self, snapshot: &StateSnapshot) -> Decision {
        if !snapshot.location.is_initialised() {
            return Decision::decline(DecisionReason::LocationUnavailable);
        }
        if snapshot.stats.max_health <= 0.0 {
            return Decision::decline(DecisionReason::InvalidMaxHealth);
        }
        if snapshot.stats.health_fraction() > self.cfg.eat_health_threshold {
            return Decision::decline(DecisionReason::HealthSufficient);
        }

        for &item_id in &snapshot.inventory {
            if self.cfg.food_item_ids.contains(&item_id) {
                return Decision::act(
                    ActionRequest::eat_item(item_id),
                    DecisionReason::EatingFood { item_id },
                );
            }
        }
        Decision::decline(DecisionReason::NoFoodFound)
    }

    /// Walk to the waypoint at the cursor and advance the cycle.
    /// Needs no snapshot data.
    fn decide_move(&mut self) -> Decision {
        if self.cfg.waypoints.is_empty() {
            return Decision::decline(DecisionReason::NoWaypoints);
        }
        let (x, y, plane) = self.cfg.waypoints[self.waypoint_cursor % self.cfg.waypoints.len()];
        self.waypoint_cursor = self.waypoint_cursor.wrapping_add(1);
        Decision::act(
            ActionRequest::walk_to(x, y, plane),
            DecisionReason::MovingToWaypoint { x, y, plane },
        )
    }

    /// Pick up the nearest ground item matching the configured id.
    fn decide_pickup(&mut self, snapshot: &StateSnapshot) -> Decision {
        if !snapshot.location.is_initialised() {
            return Decision::decline(DecisionReason::LocationUnavailable);
        }

        let mut best: Option<(f64, f64, f64)> = None;
        for item in &snapshot.ground_items {
            if item.id != self.cfg.pickup_item_id || !item.has_position() {
                continue;
            }
            let dist_sq = squared_distance(snapshot, item.x, item.y);
            match best {
                Some((best_sq, _, _)) if dist_sq >= best_sq => {}
                _ => best = Some((dist_sq, item.x, item.y)),
            }
        }

        match best {
            Some((_, x, y)) => {
                let (x, y) = (x as i64, y as i64);
                Decision::act(
                    ActionRequest::pickup_ground_item(self.cfg.pickup_item_id, x, y),
                    DecisionReason::PickupTarget {
                        item_id: self.cfg.pickup_item_id,
                        x,
                        y,
                    },
                )
            }
            None => Decision::decline(DecisionReason::NoPickupFound),
        }
    }
}

fn squared_distance(snapshot: &StateSnapshot, x: f64, y: f64) -> f64 {
    let dx = x - snapshot.location.x;
    let dy = y - snapshot.location.y;
    dx * dx + dy * dy
}
