// src/reward.rs
//
// Scalar reward for one completed step.
//
// Pure function of the config, the action taken, the decision reason,
// the snapshots before and after, and the submission outcome. Terms
// apply in a fixed order: base cost, then outcome-dependent terms,
// then the Noop override, then the death override last.

use crate::config::RewardConfig;
use crate::decision::DecisionReason;
use crate::observation::StateSnapshot;
use crate::types::{ActionCode, ActionOutcome, OutcomeStatus};

pub fn compute_reward(
    cfg: &RewardConfig,
    action: Option<ActionCode>,
    reason: &DecisionReason,
    prev: &StateSnapshot,
    new: &StateSnapshot,
    outcome: &ActionOutcome,
) -> f64 {
    let mut total = cfg.base_cost;

    match outcome.status {
        OutcomeStatus::Error => {
            total -= cfg.error_penalty;
        }
        OutcomeStatus::NoActionTaken => {
            if action != Some(ActionCode::Noop) {
                total -= declined_penalty(cfg, reason);
            }
        }
        OutcomeStatus::Submitted => {
            total += cfg.submission_bonus;
            match action {
                Some(ActionCode::AttackNpc) => total += cfg.attack_bonus,
                Some(ActionCode::EatFood) => {
                    let healed = new.stats.current_health - prev.stats.current_health;
                    if healed > 0.0 {
                        total += cfg.heal_bonus_per_hp * healed;
                    } else {
                        total -= cfg.eat_no_heal_penalty;
                    }
                }
                Some(ActionCode::MoveToWaypoint) => total += cfg.move_bonus,
                Some(ActionCode::PickupItem) => total += cfg.pickup_bonus,
                Some(ActionCode::Noop) | None => {}
            }
        }
    }

    // Noop replaces the additive terms outright.
    if action == Some(ActionCode::Noop) {
        total = cfg.noop_reward;
    }

    // Death dominates everything, including Noop.
    if new.stats.current_health <= 0.0 {
        total = cfg.death_penalty;
    }

    total
}

/// Penalty magnitude for an action the decision layer declined.
fn declined_penalty(cfg: &RewardConfig, reason: &DecisionReason) -> f64 {
    match reason {
        DecisionReason::NoTargetFound => cfg.no_target_penalty,
        DecisionReason::LocationUnavailable => cfg.location_unavailable_penalty,
        DecisionReason::NoFoodFound => cfg.no_food_penalty,
        DecisionReason::HealthSufficient => cfg.health_sufficient_penalty,
        DecisionReason::InvalidMaxHealth => cfg.invalid_max_health_penalty,
        DecisionReason::NoPickupFound => cfg.no_pickup_penalty,
        DecisionReason::UnknownAction => cfg.unknown_action_penalty,
        // Config edge, not a policy mistake: nothing to penalise.
        DecisionReason::NoWaypoints => 0.0,
        // Acting reasons and Noop never reach here with a declined
        // outcome, but a zero keeps the function total.
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RewardConfig {
        RewardConfig::default()
    }

    fn alive(health: f64) -> StateSnapshot {
        let mut s = StateSnapshot::default();
        s.stats.current_health = health;
        s.stats.max_health = 99.0;
        s
    }

    #[test]
    fn submitted_attack_scores_half() {
        let r = compute_reward(
            &cfg(),
            Some(ActionCode::AttackNpc),
            &DecisionReason::TargetAcquired {
                npc_id: 125,
                dist_sq: 4.0,
            },
            &alive(50.0),
            &alive(50.0),
            &ActionOutcome::submitted(),
        );
        // -0.1 + 0.1 + 0.5
        assert!((r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn eat_scales_with_observed_healing() {
        let r = compute_reward(
            &cfg(),
            Some(ActionCode::EatFood),
            &DecisionReason::EatingFood { item_id: 315 },
            &alive(30.0),
            &alive(36.0),
            &ActionOutcome::submitted(),
        );
        // -0.1 + 0.1 + 0.5 * 6
        assert!((r - 3.0).abs() < 1e-12);
    }

    #[test]
    fn eat_without_healing_is_penalised() {
        let r = compute_reward(
            &cfg(),
            Some(ActionCode::EatFood),
            &DecisionReason::EatingFood { item_id: 315 },
            &alive(30.0),
            &alive(30.0),
            &ActionOutcome::submitted(),
        );
        // -0.1 + 0.1 - 0.1
        assert!((r + 0.1).abs() < 1e-12);
    }

    #[test]
    fn declined_attack_pays_no_target_penalty() {
        let r = compute_reward(
            &cfg(),
            Some(ActionCode::AttackNpc),
            &DecisionReason::NoTargetFound,
            &alive(50.0),
            &alive(50.0),
            &ActionOutcome::no_action(),
        );
        // -0.1 - 0.5
        assert!((r + 0.6).abs() < 1e-12);
    }

    #[test]
    fn declined_eat_penalties_differ_by_reason() {
        let base = alive(90.0);
        let r_health = compute_reward(
            &cfg(),
            Some(ActionCode::EatFood),
            &DecisionReason::HealthSufficient,
            &base,
            &base,
            &ActionOutcome::no_action(),
        );
        assert!((r_health + 0.4).abs() < 1e-12);

        let r_food = compute_reward(
            &cfg(),
            Some(ActionCode::EatFood),
            &DecisionReason::NoFoodFound,
            &base,
            &base,
            &ActionOutcome::no_action(),
        );
        assert!((r_food + 0.4).abs() < 1e-12);

        let r_loc = compute_reward(
            &cfg(),
            Some(ActionCode::EatFood),
            &DecisionReason::LocationUnavailable,
            &base,
            &base,
            &ActionOutcome::no_action(),
        );
        assert!((r_loc + 0.6).abs() < 1e-12);
    }

    #[test]
    fn unknown_action_pays_its_penalty() {
        let r = compute_reward(
            &cfg(),
            None,
            &DecisionReason::UnknownAction,
            &alive(50.0),
            &alive(50.0),
            &ActionOutcome::no_action(),
        );
        assert!((r + 0.6).abs() < 1e-12);
    }

    #[test]
    fn error_outcome_pays_error_penalty() {
        let r = compute_reward(
            &cfg(),
            Some(ActionCode::MoveToWaypoint),
            &DecisionReason::MovingToWaypoint {
                x: 3248,
                y: 3237,
                plane: 0,
            },
            &alive(50.0),
            &alive(50.0),
            &ActionOutcome::error("timeout waiting for bridge reply"),
        );
        assert!((r + 0.6).abs() < 1e-12);
    }

    #[test]
    fn noop_is_flat_regardless_of_outcome() {
        let r = compute_reward(
            &cfg(),
            Some(ActionCode::Noop),
            &DecisionReason::Noop,
            &alive(50.0),
            &alive(50.0),
            &ActionOutcome::no_action(),
        );
        assert_eq!(r, 0.0);
    }

    #[test]
    fn death_overrides_everything() {
        let r = compute_reward(
            &cfg(),
            Some(ActionCode::AttackNpc),
            &DecisionReason::TargetAcquired {
                npc_id: 125,
                dist_sq: 1.0,
            },
            &alive(5.0),
            &alive(0.0),
            &ActionOutcome::submitted(),
        );
        assert_eq!(r, -100.0);

        let r = compute_reward(
            &cfg(),
            Some(ActionCode::Noop),
            &DecisionReason::Noop,
            &alive(5.0),
            &alive(0.0),
            &ActionOutcome::no_action(),
        );
        assert_eq!(r, -100.0);
    }
}
