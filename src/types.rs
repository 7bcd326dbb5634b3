// src/types.rs
//
// Common shared types for the bridgebot control core.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Discrete action codes exposed to the caller (the training loop).
///
/// The numeric values are the discrete action space and are stable:
/// policies trained against them must keep decoding correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionCode {
    /// Attack the nearest configured target NPC.
    AttackNpc,
    /// Eat the first configured food item if health is low.
    EatFood,
    /// Walk to the next waypoint in the configured cycle.
    MoveToWaypoint,
    /// Do nothing. Never produces a transport call.
    Noop,
    /// Pick up the configured ground item.
    PickupItem,
}

impl ActionCode {
    /// Number of discrete actions (size of the action space).
    pub const COUNT: usize = 5;

    /// Decode a caller-supplied discrete action index.
    /// Returns None for out-of-range codes.
    pub fn from_index(index: i64) -> Option<ActionCode> {
        match index {
            0 => Some(ActionCode::AttackNpc),
            1 => Some(ActionCode::EatFood),
            2 => Some(ActionCode::MoveToWaypoint),
            3 => Some(ActionCode::Noop),
            4 => Some(ActionCode::PickupItem),
            _ => None,
        }
    }

    pub fn index(&self) -> i64 {
        match self {
            ActionCode::AttackNpc => 0,
            ActionCode::EatFood => 1,
            ActionCode::MoveToWaypoint => 2,
            ActionCode::Noop => 3,
            ActionCode::PickupItem => 4,
        }
    }

    /// Stable lowercase name used in logs and step info.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCode::AttackNpc => "attack_npc",
            ActionCode::EatFood => "eat_food",
            ActionCode::MoveToWaypoint => "move_to_waypoint",
            ActionCode::Noop => "noop",
            ActionCode::PickupItem => "pickup_item",
        }
    }
}

/// A fully-parameterised action ready for submission to the bridge.
///
/// `action_type` uses the remote plugin's vocabulary ("attack_npc",
/// "interact_inventory", "walk_to", "pickup_ground_item");
/// `parameters` is the JSON payload the plugin expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action_type: String,
    pub parameters: JsonValue,
}

impl ActionRequest {
    pub fn attack_npc(npc_id: i64) -> Self {
        Self {
            action_type: "attack_npc".to_string(),
            parameters: json!({ "npc_id": npc_id }),
        }
    }

    /// Inventory interaction with the "Eat" verb.
    pub fn eat_item(item_id: i64) -> Self {
        Self {
            action_type: "interact_inventory".to_string(),
            parameters: json!({ "item_id": item_id, "action": "Eat" }),
        }
    }

    pub fn walk_to(x: i64, y: i64, plane: i64) -> Self {
        Self {
            action_type: "walk_to".to_string(),
            parameters: json!({ "x": x, "y": y, "plane": plane }),
        }
    }

    pub fn pickup_ground_item(item_id: i64, x: i64, y: i64) -> Self {
        Self {
            action_type: "pickup_ground_item".to_string(),
            parameters: json!({ "item_id": item_id, "x": x, "y": y }),
        }
    }

    /// Encode the wire payload: `{"action_type":...,"parameters":{...}}`.
    pub fn to_payload(&self) -> JsonValue {
        json!({
            "action_type": self.action_type,
            "parameters": self.parameters,
        })
    }
}

/// Outcome of submitting one action to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// The plugin accepted the command.
    Submitted,
    /// Transport or plugin failure.
    Error,
    /// The decision layer declined to act; nothing was sent.
    NoActionTaken,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Submitted => "submitted",
            OutcomeStatus::Error => "error",
            OutcomeStatus::NoActionTaken => "no_action_taken",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub status: OutcomeStatus,
    pub message: Option<String>,
}

impl ActionOutcome {
    pub fn submitted() -> Self {
        Self {
            status: OutcomeStatus::Submitted,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn no_action() -> Self {
        Self {
            status: OutcomeStatus::NoActionTaken,
            message: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_code_roundtrip() {
        for i in 0..ActionCode::COUNT as i64 {
            let code = ActionCode::from_index(i).expect("valid index");
            assert_eq!(code.index(), i);
        }
        assert_eq!(ActionCode::from_index(-1), None);
        assert_eq!(ActionCode::from_index(ActionCode::COUNT as i64), None);
    }

    #[test]
    fn eat_request_carries_verb() {
        let req = ActionRequest::eat_item(315);
        assert_eq!(req.action_type, "interact_inventory");
        assert_eq!(req.parameters["action"], "Eat");
        assert_eq!(req.parameters["item_id"], 315);
    }

    #[test]
    fn payload_wraps_type_and_parameters() {
        let req = ActionRequest::walk_to(3248, 3237, 0);
        let payload = req.to_payload();
        assert_eq!(payload["action_type"], "walk_to");
        assert_eq!(payload["parameters"]["x"], 3248);
    }
}
