//! Typed views of CLIP v2 resources.
//!
//! The bridge returns deeply nested JSON; everything the rest of the crate
//! touches is deserialized once into these structs at the client boundary.
//! Optional sub-objects stay `Option` so a missing key can never panic a
//! command half-way through a mutation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Light,
    Room,
    Zone,
    Scene,
    Device,
    Button,
    Motion,
    BehaviorInstance,
}

impl ResourceType {
    /// Path segment under `/clip/v2/resource/`.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceType::Light => "light",
            ResourceType::Room => "room",
            ResourceType::Zone => "zone",
            ResourceType::Scene => "scene",
            ResourceType::Device => "device",
            ResourceType::Button => "button",
            ResourceType::Motion => "motion",
            ResourceType::BehaviorInstance => "behavior_instance",
        }
    }
}

/// `{rid, rtype}` reference as used in `group`, `children`, `target` and
/// `owner` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRef {
    pub rid: String,
    pub rtype: String,
}

impl ResourceRef {
    pub fn light(rid: &str) -> Self {
        Self {
            rid: rid.to_string(),
            rtype: "light".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archetype: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnState {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Dimming {
    pub brightness: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColorTemperature {
    pub mirek: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub xy: Xy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Light {
    pub id: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ResourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<OnState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimming: Option<Dimming>,
}

/// A room or a zone. Rooms list device children, zones list light children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedEntity {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub children: Vec<ResourceRef>,
}

/// Desired state for one light inside a scene. Unknown sub-objects
/// (gradient, effects, ...) ride along in `extra` so a recreated scene
/// keeps them verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ActionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<OnState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimming: Option<Dimming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<ColorTemperature>,
    #[serde(flatten, default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, Value>,
}

impl ActionState {
    pub fn off() -> Self {
        Self {
            on: Some(OnState { on: false }),
            ..Default::default()
        }
    }

    /// Turn the light off in place. The bridge must not receive brightness
    /// or colour data on an off action, so those sub-objects are dropped.
    pub fn turn_off(&mut self) {
        self.on = Some(OnState { on: false });
        self.dimming = None;
        self.color = None;
        self.color_temperature = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneAction {
    pub target: ResourceRef,
    pub action: ActionState,
}

impl SceneAction {
    /// Minimal action turning a light off.
    pub fn off(light_id: &str) -> Self {
        Self {
            target: ResourceRef::light(light_id),
            action: ActionState::off(),
        }
    }

    /// Action turning a light on at full brightness, used when an edit adds
    /// a light that the scene did not previously cover.
    pub fn on_full(light_id: &str) -> Self {
        Self {
            target: ResourceRef::light(light_id),
            action: ActionState {
                on: Some(OnState { on: true }),
                dimming: Some(Dimming { brightness: 100.0 }),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub group: ResourceRef,
    #[serde(default)]
    pub actions: Vec<SceneAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_dynamic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Value>,
}

impl Scene {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Palette ready for a create call. `palette.effects` is mutually
    /// exclusive with `effects_v2`, which the bridge also returns, so it is
    /// stripped before the palette is sent back.
    pub fn palette_for_create(&self) -> Option<Value> {
        let mut palette = self.palette.clone()?;
        if let Some(map) = palette.as_object_mut() {
            map.remove("effects");
        }
        Some(palette)
    }
}

/// Payload for a scene create call. The old scene is deleted after the
/// replacement exists; there is no in-place scene update in this API model.
#[derive(Debug, Clone, Serialize)]
pub struct NewScene {
    pub name: String,
    pub group: ResourceRef,
    pub actions: Vec<SceneAction>,
    pub auto_dynamic: bool,
    pub speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Value>,
}

impl NewScene {
    /// A scene derived from `source` under a different name, keeping its
    /// dynamic/speed/palette settings.
    pub fn derived(source: &Scene, name: &str, group: ResourceRef, actions: Vec<SceneAction>) -> Self {
        Self {
            name: name.to_string(),
            group,
            actions,
            auto_dynamic: source.auto_dynamic.unwrap_or(true),
            speed: source.speed.unwrap_or(0.6),
            palette: source.palette_for_create(),
        }
    }

    /// The replacement used by bulk rewrites: same name, same group.
    pub fn replacing(source: &Scene, actions: Vec<SceneAction>) -> Self {
        Self::derived(source, source.name(), source.group.clone(), actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_scene_action_and_keeps_unknown_fields() {
        let raw = json!({
            "target": {"rid": "l1", "rtype": "light"},
            "action": {
                "on": {"on": true},
                "dimming": {"brightness": 72.5},
                "color_temperature": {"mirek": 366},
                "gradient": {"points": []}
            }
        });
        let action: SceneAction = serde_json::from_value(raw).unwrap();
        assert_eq!(action.target.rid, "l1");
        assert_eq!(action.action.dimming.unwrap().brightness, 72.5);
        assert_eq!(action.action.color_temperature.unwrap().mirek, 366);
        assert!(action.action.extra.contains_key("gradient"));

        let back = serde_json::to_value(&action).unwrap();
        assert!(back["action"]["gradient"].is_object());
    }

    #[test]
    fn turn_off_clears_brightness_and_colour() {
        let raw = json!({
            "on": {"on": true},
            "dimming": {"brightness": 50.0},
            "color": {"xy": {"x": 0.4, "y": 0.4}},
            "color_temperature": {"mirek": 300}
        });
        let mut state: ActionState = serde_json::from_value(raw).unwrap();
        state.turn_off();
        assert_eq!(state.on, Some(OnState { on: false }));
        assert!(state.dimming.is_none());
        assert!(state.color.is_none());
        assert!(state.color_temperature.is_none());

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back, json!({"on": {"on": false}}));
    }

    #[test]
    fn palette_for_create_strips_effects() {
        let scene = Scene {
            id: "s1".into(),
            metadata: Metadata {
                name: "Relax".into(),
                archetype: None,
            },
            group: ResourceRef {
                rid: "z1".into(),
                rtype: "zone".into(),
            },
            actions: vec![],
            speed: Some(0.6),
            auto_dynamic: Some(true),
            palette: Some(json!({
                "color": [],
                "effects": [{"effect": "candle"}],
                "effects_v2": []
            })),
        };
        let palette = scene.palette_for_create().unwrap();
        assert!(palette.get("effects").is_none());
        assert!(palette.get("effects_v2").is_some());
    }

    #[test]
    fn new_scene_defaults_when_source_omits_settings() {
        let scene = Scene {
            id: "s1".into(),
            metadata: Metadata::default(),
            group: ResourceRef {
                rid: "r1".into(),
                rtype: "room".into(),
            },
            actions: vec![],
            speed: None,
            auto_dynamic: None,
            palette: None,
        };
        let new = NewScene::replacing(&scene, vec![]);
        assert!(new.auto_dynamic);
        assert_eq!(new.speed, 0.6);
        assert!(new.palette.is_none());
    }
}
