// huectl - CLI for a Hue bridge's local CLIP v2 API
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Zone helpers: membership, scene projection and derived-scene naming.

use crate::model::{GroupedEntity, Light, SceneAction};
use std::collections::{HashMap, HashSet};

/// Hard bridge limit on scene name length.
pub const MAX_SCENE_NAME_LENGTH: usize = 32;

/// Light rids that are members of a zone, in the zone's own order.
pub fn zone_light_ids(zone: &GroupedEntity) -> Vec<String> {
    zone.children
        .iter()
        .filter(|child| child.rtype == "light")
        .map(|child| child.rid.clone())
        .collect()
}

/// Whether a room or zone contains a light, directly (zones list lights)
/// or through the owning device (rooms list devices).
pub fn group_contains_light(group: &GroupedEntity, light: &Light) -> bool {
    group.children.iter().any(|child| {
        (child.rtype == "light" && child.rid == light.id)
            || (child.rtype == "device"
                && light.owner.as_ref().is_some_and(|o| o.rid == child.rid))
    })
}

/// Light rids whose name contains `pattern` (case-insensitive). May match
/// several lights; exclusion patterns are deliberately broad.
pub fn lights_matching(lights: &[Light], pattern: &str) -> Vec<String> {
    let needle = pattern.to_lowercase();
    lights
        .iter()
        .filter(|l| l.metadata.name.to_lowercase().contains(&needle))
        .map(|l| l.id.clone())
        .collect()
}

/// Project a source scene's actions onto a zone.
///
/// The bridge requires a zone-bound scene to carry an action for every
/// light in the zone, so the result has exactly one entry per zone light,
/// in zone order. Excluded lights and lights the source does not mention
/// get an explicit off action; source actions for lights outside the zone
/// are dropped.
pub fn project_actions(
    source: &[SceneAction],
    zone_lights: &[String],
    excluded: &HashSet<String>,
) -> Vec<SceneAction> {
    let lookup: HashMap<&str, &SceneAction> = source
        .iter()
        .map(|action| (action.target.rid.as_str(), action))
        .collect();

    zone_lights
        .iter()
        .map(|rid| {
            if excluded.contains(rid) {
                SceneAction::off(rid)
            } else if let Some(action) = lookup.get(rid.as_str()) {
                (*action).clone()
            } else {
                SceneAction::off(rid)
            }
        })
        .collect()
}

/// Name for a zone-projected scene: `"{original} ({zone_short})"`, with a
/// `" -X"` suffix when lights were excluded, hard-truncated to the bridge
/// limit. Truncation may cut mid-word or collide with an existing name;
/// the bridge accepts both.
pub fn generate_scene_name(original_name: &str, zone_name: &str, has_exclusions: bool) -> String {
    let zone_short = zone_name
        .replace("Combined ", "")
        .replace("combined ", "");

    let mut name = format!("{original_name} ({zone_short})");
    if has_exclusions {
        name.push_str(" -X");
    }

    if name.chars().count() > MAX_SCENE_NAME_LENGTH {
        name = name.chars().take(MAX_SCENE_NAME_LENGTH).collect();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionState, Dimming, Metadata, OnState, ResourceRef};

    fn zone(children: &[&str]) -> GroupedEntity {
        GroupedEntity {
            id: "z1".into(),
            kind: "zone".into(),
            metadata: Metadata {
                name: "Lounge".into(),
                archetype: None,
            },
            children: children.iter().map(|rid| ResourceRef::light(rid)).collect(),
        }
    }

    fn action_on(light_id: &str) -> SceneAction {
        SceneAction {
            target: ResourceRef::light(light_id),
            action: ActionState {
                on: Some(OnState { on: true }),
                dimming: Some(Dimming { brightness: 60.0 }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn zone_light_ids_skips_non_light_children() {
        let mut zone = zone(&["a", "b"]);
        zone.children.push(ResourceRef {
            rid: "dev".into(),
            rtype: "device".into(),
        });
        assert_eq!(zone_light_ids(&zone), vec!["a", "b"]);
    }

    #[test]
    fn projection_covers_every_zone_light() {
        let zone_lights: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let source = vec![action_on("a")];
        let projected = project_actions(&source, &zone_lights, &HashSet::new());
        assert_eq!(projected.len(), 3);
        assert_eq!(projected[0], action_on("a"));
        assert_eq!(projected[1], SceneAction::off("b"));
        assert_eq!(projected[2], SceneAction::off("c"));
    }

    #[test]
    fn exclusion_beats_source_action() {
        let zone_lights: Vec<String> = vec!["a".into(), "b".into()];
        let source = vec![action_on("a"), action_on("b")];
        let excluded: HashSet<String> = ["b".to_string()].into();
        let projected = project_actions(&source, &zone_lights, &excluded);
        assert_eq!(projected[1], SceneAction::off("b"));
    }

    #[test]
    fn source_actions_outside_the_zone_are_dropped() {
        let zone_lights: Vec<String> = vec!["a".into()];
        let source = vec![action_on("a"), action_on("elsewhere")];
        let projected = project_actions(&source, &zone_lights, &HashSet::new());
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].target.rid, "a");
    }

    #[test]
    fn projection_preserves_zone_order() {
        let zone_lights: Vec<String> = vec!["c".into(), "a".into(), "b".into()];
        let source = vec![action_on("a"), action_on("b"), action_on("c")];
        let projected = project_actions(&source, &zone_lights, &HashSet::new());
        let order: Vec<&str> = projected.iter().map(|a| a.target.rid.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn scene_name_strips_combined_prefix_and_marks_exclusions() {
        assert_eq!(
            generate_scene_name("Evening Glow", "Combined Lounge Zone", true),
            "Evening Glow (Lounge Zone) -X"
        );
        assert_eq!(
            generate_scene_name("Bright", "combined lounge", false),
            "Bright (lounge)"
        );
    }

    #[test]
    fn scene_name_is_hard_truncated_to_the_bridge_limit() {
        let name = generate_scene_name(
            "A very long original scene name",
            "Somewhere spacious",
            true,
        );
        assert_eq!(name.chars().count(), MAX_SCENE_NAME_LENGTH);
        assert!(!name.ends_with(" -X"));

        // Deterministic: same inputs, same output.
        assert_eq!(
            name,
            generate_scene_name("A very long original scene name", "Somewhere spacious", true)
        );
    }

    #[test]
    fn matches_lights_by_substring() {
        let lights = vec![
            Light {
                id: "l1".into(),
                metadata: Metadata {
                    name: "Christmas tree sparkly".into(),
                    archetype: None,
                },
                owner: None,
                on: None,
                dimming: None,
            },
            Light {
                id: "l2".into(),
                metadata: Metadata {
                    name: "Lamp lounge".into(),
                    archetype: None,
                },
                owner: None,
                on: None,
                dimming: None,
            },
        ];
        assert_eq!(lights_matching(&lights, "sparkly"), vec!["l1"]);
        assert_eq!(lights_matching(&lights, "L"), vec!["l1", "l2"]);
        assert!(lights_matching(&lights, "garage").is_empty());
    }
}
