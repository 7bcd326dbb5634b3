// src/observation.rs
//
// Fixed-shape state snapshot and the telemetry normalizer.
//
// The decision and reward layers only ever see a `StateSnapshot`: a
// fixed-capacity, sentinel-padded view of the world that is identical
// in shape for every tick, whatever the bridge sent. Absent or
// malformed data degrades to defaults and sentinels, never to an
// error. Names are split out into `Descriptors` so the numeric
// snapshot stays a plain `Copy` value.

use serde::{Deserialize, Serialize};

use crate::telemetry::{RawGroundItem, RawItem, RawNpc, TelemetryFrame};

/// NPC slots retained per snapshot. Source order, extras dropped.
pub const MAX_NEARBY_NPCS: usize = 3;
/// Inventory slots retained per snapshot.
pub const MAX_INVENTORY_SLOTS: usize = 5;
/// Ground item slots retained per snapshot.
pub const MAX_GROUND_ITEMS: usize = 5;

/// Id / coordinate value for an unused slot.
pub const SLOT_SENTINEL: i64 = -1;

/// Player vitals. All zero when telemetry is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub current_health: f64,
    pub max_health: f64,
    pub current_prayer: f64,
    pub max_prayer: f64,
    /// Run energy as a fraction in [0, 1].
    pub run_energy: f64,
}

impl PlayerStats {
    /// Health fraction, 0 when max health is unusable.
    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            self.current_health / self.max_health
        } else {
            0.0
        }
    }
}

/// Player world position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerLocation {
    pub x: f64,
    pub y: f64,
    pub plane: f64,
}

impl PlayerLocation {
    /// The origin doubles as "no position received yet"; rules that
    /// need a position treat it as unavailable.
    pub fn is_initialised(&self) -> bool {
        !(self.x == 0.0 && self.y == 0.0)
    }
}

/// One NPC slot. Sentinel-filled when unused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpcSlot {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub animation: i64,
}

impl Default for NpcSlot {
    fn default() -> Self {
        Self {
            id: SLOT_SENTINEL,
            x: SLOT_SENTINEL as f64,
            y: SLOT_SENTINEL as f64,
            animation: SLOT_SENTINEL,
        }
    }
}

impl NpcSlot {
    pub fn is_present(&self) -> bool {
        self.id != SLOT_SENTINEL
    }

    /// True when the slot carries a usable position. Both coordinates
    /// must be non-sentinel; a half-missing location is unusable.
    pub fn has_position(&self) -> bool {
        self.is_present() && self.x != SLOT_SENTINEL as f64 && self.y != SLOT_SENTINEL as f64
    }
}

/// One ground item slot. Sentinel-filled when unused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundItemSlot {
    pub id: i64,
    pub quantity: i64,
    pub x: f64,
    pub y: f64,
}

impl Default for GroundItemSlot {
    fn default() -> Self {
        Self {
            id: SLOT_SENTINEL,
            quantity: 0,
            x: SLOT_SENTINEL as f64,
            y: SLOT_SENTINEL as f64,
        }
    }
}

impl GroundItemSlot {
    pub fn is_present(&self) -> bool {
        self.id != SLOT_SENTINEL
    }

    /// True when the slot carries a usable position. Both coordinates
    /// must be non-sentinel; a half-missing location is unusable.
    pub fn has_position(&self) -> bool {
        self.is_present() && self.x != SLOT_SENTINEL as f64 && self.y != SLOT_SENTINEL as f64
    }
}

/// Fixed-shape world view handed to the decision and reward layers.
///
/// Normalizing the same frame twice yields an equal snapshot; the
/// conversion is pure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub stats: PlayerStats,
    pub location: PlayerLocation,
    /// Current player animation id, -1 when idle or unknown.
    pub animation: i64,
    pub npcs: [NpcSlot; MAX_NEARBY_NPCS],
    /// Item ids by slot, sentinel for empty slots.
    pub inventory: [i64; MAX_INVENTORY_SLOTS],
    pub ground_items: [GroundItemSlot; MAX_GROUND_ITEMS],
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            stats: PlayerStats::default(),
            location: PlayerLocation::default(),
            animation: SLOT_SENTINEL,
            npcs: [NpcSlot::default(); MAX_NEARBY_NPCS],
            inventory: [SLOT_SENTINEL; MAX_INVENTORY_SLOTS],
            ground_items: [GroundItemSlot::default(); MAX_GROUND_ITEMS],
        }
    }
}

/// Display names for the slots of a snapshot, same slot order.
/// Unused slots carry "", present-but-unnamed entries carry "Unknown".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptors {
    pub npc_names: Vec<String>,
    pub inventory_names: Vec<String>,
    pub ground_item_names: Vec<String>,
}

impl Descriptors {
    fn empty() -> Self {
        Self {
            npc_names: vec![String::new(); MAX_NEARBY_NPCS],
            inventory_names: vec![String::new(); MAX_INVENTORY_SLOTS],
            ground_item_names: vec![String::new(); MAX_GROUND_ITEMS],
        }
    }
}

/// Convert one telemetry frame into the fixed-shape snapshot.
///
/// Error frames normalize to the all-default snapshot. Malformed list
/// elements are skipped with a warning and cost only their own slot;
/// source order is preserved and extras beyond capacity are dropped.
pub fn normalize(frame: &TelemetryFrame) -> (StateSnapshot, Descriptors) {
    let mut snapshot = StateSnapshot::default();
    let mut names = Descriptors::empty();

    if frame.is_error() {
        return (snapshot, names);
    }
    let record = &frame.record;

    snapshot.stats = PlayerStats {
        current_health: record.player_current_health.unwrap_or(0.0),
        max_health: record.player_max_health.unwrap_or(0.0),
        current_prayer: record.player_current_prayer.unwrap_or(0.0),
        max_prayer: record.player_max_prayer.unwrap_or(0.0),
        run_energy: (record.player_run_energy_percentage.unwrap_or(0.0) / 100.0).clamp(0.0, 1.0),
    };
    snapshot.animation = record.player_animation.unwrap_or(SLOT_SENTINEL);

    if let Some(loc) = &record.player_location {
        snapshot.location = PlayerLocation {
            x: loc.x.unwrap_or(0.0),
            y: loc.y.unwrap_or(0.0),
            plane: loc.plane.unwrap_or(0.0),
        };
    }

    if let Some(entries) = &record.nearby_npcs {
        let mut filled = 0;
        for entry in entries {
            if filled == MAX_NEARBY_NPCS {
                break;
            }
            let npc: RawNpc = match serde_json::from_value(entry.clone()) {
                Ok(npc) => npc,
                Err(err) => {
                    eprintln!("WARN: skipping malformed npc entry: {err}");
                    continue;
                }
            };
            let loc = npc.location.unwrap_or_default();
            snapshot.npcs[filled] = NpcSlot {
                id: npc.id.unwrap_or(SLOT_SENTINEL),
                x: loc.x.unwrap_or(SLOT_SENTINEL as f64),
                y: loc.y.unwrap_or(SLOT_SENTINEL as f64),
                animation: npc.animation.unwrap_or(SLOT_SENTINEL),
            };
            names.npc_names[filled] = npc.name.unwrap_or_else(|| "Unknown".to_string());
            filled += 1;
        }
    }

    if let Some(entries) = &record.inventory {
        let mut filled = 0;
        for entry in entries {
            if filled == MAX_INVENTORY_SLOTS {
                break;
            }
            let item: RawItem = match serde_json::from_value(entry.clone()) {
                Ok(item) => item,
                Err(err) => {
                    eprintln!("WARN: skipping malformed inventory entry: {err}");
                    continue;
                }
            };
            snapshot.inventory[filled] = item.id.unwrap_or(SLOT_SENTINEL);
            names.inventory_names[filled] = item.name.unwrap_or_else(|| "Unknown".to_string());
            filled += 1;
        }
    }

    if let Some(entries) = &record.nearby_ground_items {
        let mut filled = 0;
        for entry in entries {
            if filled == MAX_GROUND_ITEMS {
                break;
            }
            let item: RawGroundItem = match serde_json::from_value(entry.clone()) {
                Ok(item) => item,
                Err(err) => {
                    eprintln!("WARN: skipping malformed ground item entry: {err}");
                    continue;
                }
            };
            let loc = item.location.unwrap_or_default();
            snapshot.ground_items[filled] = GroundItemSlot {
                id: item.id.unwrap_or(SLOT_SENTINEL),
                quantity: item.quantity.unwrap_or(0),
                x: loc.x.unwrap_or(SLOT_SENTINEL as f64),
                y: loc.y.unwrap_or(SLOT_SENTINEL as f64),
            };
            names.ground_item_names[filled] = item.name.unwrap_or_else(|| "Unknown".to_string());
            filled += 1;
        }
    }

    (snapshot, names)
}

/// Whether an animation id is one of the configured combat animations.
pub fn is_combat_animation(animation: i64, combat_ids: &[i64]) -> bool {
    animation != SLOT_SENTINEL && combat_ids.contains(&animation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(value: serde_json::Value) -> TelemetryFrame {
        TelemetryFrame::from_value(value)
    }

    #[test]
    fn error_frame_normalizes_to_defaults() {
        let frame = TelemetryFrame::transport_error("timeout waiting for bridge reply");
        let (snapshot, names) = normalize(&frame);
        assert_eq!(snapshot, StateSnapshot::default());
        assert_eq!(snapshot.stats.current_health, 0.0);
        assert_eq!(snapshot.animation, SLOT_SENTINEL);
        assert!(names.npc_names.iter().all(String::is_empty));
    }

    #[test]
    fn vitals_and_location_carry_through() {
        let (snapshot, _) = normalize(&frame(json!({
            "player_current_health": 50,
            "player_max_health": 99,
            "player_current_prayer": 10,
            "player_max_prayer": 43,
            "player_run_energy_percentage": 75,
            "player_animation": 422,
            "player_location": {"x": 3248, "y": 3237, "plane": 0},
        })));
        assert_eq!(snapshot.stats.current_health, 50.0);
        assert_eq!(snapshot.stats.max_health, 99.0);
        assert!((snapshot.stats.run_energy - 0.75).abs() < 1e-12);
        assert_eq!(snapshot.animation, 422);
        assert_eq!(snapshot.location.x, 3248.0);
        assert!(snapshot.location.is_initialised());
        assert!((snapshot.stats.health_fraction() - 50.0 / 99.0).abs() < 1e-12);
    }

    #[test]
    fn run_energy_is_clamped() {
        let (snapshot, _) = normalize(&frame(json!({
            "player_run_energy_percentage": 140,
        })));
        assert_eq!(snapshot.stats.run_energy, 1.0);

        let (snapshot, _) = normalize(&frame(json!({
            "player_run_energy_percentage": -5,
        })));
        assert_eq!(snapshot.stats.run_energy, 0.0);
    }

    #[test]
    fn npc_slots_pad_and_truncate_in_source_order() {
        let (snapshot, names) = normalize(&frame(json!({
            "nearby_npcs": [
                {"id": 125, "name": "Goblin", "animation": 6, "location": {"x": 10, "y": 20}},
            ],
        })));
        assert_eq!(snapshot.npcs[0].id, 125);
        assert_eq!(snapshot.npcs[0].x, 10.0);
        assert_eq!(names.npc_names[0], "Goblin");
        assert!(!snapshot.npcs[1].is_present());
        assert_eq!(names.npc_names[1], "");

        let (snapshot, _) = normalize(&frame(json!({
            "nearby_npcs": [
                {"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}, {"id": 5},
            ],
        })));
        assert_eq!(snapshot.npcs[0].id, 1);
        assert_eq!(snapshot.npcs[1].id, 2);
        assert_eq!(snapshot.npcs[2].id, 3);
    }

    #[test]
    fn malformed_list_element_skips_only_itself() {
        let (snapshot, names) = normalize(&frame(json!({
            "inventory": [
                {"id": 315, "name": "Shrimps"},
                "not an item",
                {"id": 526, "name": "Bones"},
            ],
        })));
        assert_eq!(snapshot.inventory[0], 315);
        assert_eq!(snapshot.inventory[1], 526);
        assert_eq!(snapshot.inventory[2], SLOT_SENTINEL);
        assert_eq!(names.inventory_names[1], "Bones");
    }

    #[test]
    fn unnamed_present_entry_reads_unknown() {
        let (snapshot, names) = normalize(&frame(json!({
            "nearby_ground_items": [
                {"id": 526, "quantity": 2, "location": {"x": 1, "y": 2}},
            ],
        })));
        assert_eq!(snapshot.ground_items[0].id, 526);
        assert_eq!(snapshot.ground_items[0].quantity, 2);
        assert_eq!(names.ground_item_names[0], "Unknown");
    }

    #[test]
    fn normalization_is_pure() {
        let f = frame(json!({
            "player_current_health": 30,
            "nearby_npcs": [{"id": 125, "location": {"x": 5, "y": 5}}],
        }));
        assert_eq!(normalize(&f), normalize(&f));
    }

    #[test]
    fn half_missing_coordinates_are_not_a_position() {
        let npc = NpcSlot {
            id: 125,
            x: SLOT_SENTINEL as f64,
            y: 20.0,
            animation: -1,
        };
        assert!(npc.is_present());
        assert!(!npc.has_position());

        let item = GroundItemSlot {
            id: 526,
            quantity: 1,
            x: 10.0,
            y: SLOT_SENTINEL as f64,
        };
        assert!(item.is_present());
        assert!(!item.has_position());

        let located = NpcSlot {
            id: 125,
            x: 5.0,
            y: 20.0,
            animation: -1,
        };
        assert!(located.has_position());
    }

    #[test]
    fn combat_animation_lookup() {
        let ids = [422, 423, 390];
        assert!(is_combat_animation(422, &ids));
        assert!(!is_combat_animation(7, &ids));
        assert!(!is_combat_animation(SLOT_SENTINEL, &ids));
    }
}
