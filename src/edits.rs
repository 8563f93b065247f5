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

//! Scene edits: parsing, validation and the action-list merge.
//!
//! All light names are resolved and all values validated before any action
//! list is touched, so a failing edit never leaves a half-built scene.

use crate::model::{Dimming, Light, OnState, SceneAction};
use crate::resolve::{Resolution, resolve};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("light '{query}' not found")]
    LightNotFound {
        query: String,
        suggestions: Vec<String>,
    },
    #[error("multiple lights match '{query}': {}", .matches.join(", "))]
    AmbiguousLight { query: String, matches: Vec<String> },
    #[error("invalid brightness format '{0}' (expected \"LightName=50%\")")]
    BrightnessFormat(String),
    #[error("invalid brightness value '{0}'")]
    BrightnessValue(String),
    #[error("brightness must be 0-100, got {0}")]
    BrightnessRange(f64),
    #[error("light '{0}' is not in the scene; use --turn-on to add it first")]
    LightNotInScene(String),
}

/// A raw edit as given on the command line, light identified by name.
#[derive(Debug, Clone, PartialEq)]
pub enum EditSpec {
    TurnOff(String),
    TurnOn(String),
    /// `"LightName=50%"` key=value spec.
    Brightness(String),
    RemoveLight(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    TurnOff,
    TurnOn,
    Brightness(f64),
    Remove,
}

/// An edit with its light name resolved to a unique id.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub op: EditOp,
    pub light_id: String,
    pub light_name: String,
}

/// What `--remove-light` means for the scene at hand.
///
/// Ad-hoc duplicated scenes may drop an action entry; scenes bound to a
/// group must keep an action for every group light, so removal is coerced
/// into turning the light off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovePolicy {
    Delete,
    TurnOff,
}

/// Split a `"LightName=50%"` spec into name and validated value.
pub fn parse_brightness_spec(spec: &str) -> Result<(String, f64), EditError> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| EditError::BrightnessFormat(spec.to_string()))?;
    let raw = value.trim().trim_end_matches('%');
    let brightness: f64 = raw
        .parse()
        .map_err(|_| EditError::BrightnessValue(raw.to_string()))?;
    if !(0.0..=100.0).contains(&brightness) {
        return Err(EditError::BrightnessRange(brightness));
    }
    Ok((name.trim().to_string(), brightness))
}

/// Resolve every spec against the light list up front. Any failure aborts
/// the whole batch before a single action is modified.
pub fn resolve_edits(specs: &[EditSpec], lights: &[Light]) -> Result<Vec<Edit>, EditError> {
    let refs: Vec<&Light> = lights.iter().collect();
    specs
        .iter()
        .map(|spec| {
            let (name, op) = match spec {
                EditSpec::TurnOff(name) => (name.clone(), EditOp::TurnOff),
                EditSpec::TurnOn(name) => (name.clone(), EditOp::TurnOn),
                EditSpec::Brightness(raw) => {
                    let (name, value) = parse_brightness_spec(raw)?;
                    (name, EditOp::Brightness(value))
                }
                EditSpec::RemoveLight(name) => (name.clone(), EditOp::Remove),
            };
            let light = match resolve(&name, &refs) {
                Resolution::Unique(light) => light,
                Resolution::Ambiguous(matches) => {
                    return Err(EditError::AmbiguousLight {
                        query: name,
                        matches: matches.iter().map(|l| l.metadata.name.clone()).collect(),
                    });
                }
                Resolution::NotFound(suggestions) => {
                    return Err(EditError::LightNotFound {
                        query: name,
                        suggestions,
                    });
                }
            };
            Ok(Edit {
                op,
                light_id: light.id.clone(),
                light_name: light.metadata.name.clone(),
            })
        })
        .collect()
}

/// One entry of the applied-edit log, consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedEdit {
    TurnedOff { light: String, added: bool },
    TurnedOn { light: String, added: bool },
    Brightness { light: String, value: f64 },
    Removed { light: String },
    RemoveSkipped { light: String },
}

impl fmt::Display for AppliedEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedEdit::TurnedOff { light, added: false } => write!(f, "Turn OFF: {light}"),
            AppliedEdit::TurnedOff { light, added: true } => write!(f, "Turn OFF: {light} (added)"),
            AppliedEdit::TurnedOn { light, added: false } => write!(f, "Turn ON: {light}"),
            AppliedEdit::TurnedOn { light, added: true } => write!(f, "Turn ON: {light} (added)"),
            AppliedEdit::Brightness { light, value } => {
                write!(f, "Set brightness: {light} = {value}%")
            }
            AppliedEdit::Removed { light } => write!(f, "Remove light: {light}"),
            AppliedEdit::RemoveSkipped { light } => {
                write!(f, "Remove light: {light} (not in scene, skipped)")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub actions: Vec<SceneAction>,
    pub applied: Vec<AppliedEdit>,
    /// False when no edit structurally touched the action list; callers
    /// must skip the create/delete round-trip in that case.
    pub modified: bool,
}

/// Apply pre-resolved edits to a scene's action list, producing a new list.
/// The input is never mutated.
pub fn apply_edits(
    actions: &[SceneAction],
    edits: &[Edit],
    policy: RemovePolicy,
) -> Result<MergeOutcome, EditError> {
    let mut new_actions = actions.to_vec();
    let mut applied = Vec::new();
    let mut modified = false;

    for edit in edits {
        let idx = new_actions
            .iter()
            .position(|a| a.target.rid == edit.light_id);

        match &edit.op {
            EditOp::TurnOff => match idx {
                Some(i) => {
                    new_actions[i].action.turn_off();
                    modified = true;
                    applied.push(AppliedEdit::TurnedOff {
                        light: edit.light_name.clone(),
                        added: false,
                    });
                }
                None => {
                    new_actions.push(SceneAction::off(&edit.light_id));
                    modified = true;
                    applied.push(AppliedEdit::TurnedOff {
                        light: edit.light_name.clone(),
                        added: true,
                    });
                }
            },
            EditOp::TurnOn => match idx {
                Some(i) => {
                    new_actions[i].action.on = Some(OnState { on: true });
                    modified = true;
                    applied.push(AppliedEdit::TurnedOn {
                        light: edit.light_name.clone(),
                        added: false,
                    });
                }
                None => {
                    new_actions.push(SceneAction::on_full(&edit.light_id));
                    modified = true;
                    applied.push(AppliedEdit::TurnedOn {
                        light: edit.light_name.clone(),
                        added: true,
                    });
                }
            },
            EditOp::Brightness(value) => match idx {
                Some(i) => {
                    let state = &mut new_actions[i].action;
                    if state.on.is_none() {
                        state.on = Some(OnState { on: true });
                    }
                    state.dimming = Some(Dimming { brightness: *value });
                    modified = true;
                    applied.push(AppliedEdit::Brightness {
                        light: edit.light_name.clone(),
                        value: *value,
                    });
                }
                None => return Err(EditError::LightNotInScene(edit.light_name.clone())),
            },
            EditOp::Remove => match (policy, idx) {
                (RemovePolicy::Delete, Some(i)) => {
                    new_actions.remove(i);
                    modified = true;
                    applied.push(AppliedEdit::Removed {
                        light: edit.light_name.clone(),
                    });
                }
                (RemovePolicy::Delete, None) => {
                    applied.push(AppliedEdit::RemoveSkipped {
                        light: edit.light_name.clone(),
                    });
                }
                (RemovePolicy::TurnOff, Some(i)) => {
                    // Group-bound scenes must cover every group light, so
                    // the whole action is replaced by a bare off.
                    new_actions[i].action = crate::model::ActionState::off();
                    modified = true;
                    applied.push(AppliedEdit::Removed {
                        light: edit.light_name.clone(),
                    });
                }
                // Removal is opt-in; a light absent from this scene needs
                // no off entry added.
                (RemovePolicy::TurnOff, None) => {}
            },
        }
    }

    Ok(MergeOutcome {
        actions: new_actions,
        applied,
        modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionState, Color, ColorTemperature, Metadata, Xy};

    fn light(id: &str, name: &str) -> Light {
        Light {
            id: id.into(),
            metadata: Metadata {
                name: name.into(),
                archetype: None,
            },
            owner: None,
            on: None,
            dimming: None,
        }
    }

    fn action_on(light_id: &str, brightness: f64) -> SceneAction {
        SceneAction {
            target: crate::model::ResourceRef::light(light_id),
            action: ActionState {
                on: Some(OnState { on: true }),
                dimming: Some(Dimming { brightness }),
                color: Some(Color {
                    xy: Xy { x: 0.45, y: 0.41 },
                }),
                color_temperature: Some(ColorTemperature { mirek: 366 }),
                ..Default::default()
            },
        }
    }

    fn edit(op: EditOp, light_id: &str, name: &str) -> Edit {
        Edit {
            op,
            light_id: light_id.into(),
            light_name: name.into(),
        }
    }

    #[test]
    fn parses_brightness_specs() {
        assert_eq!(
            parse_brightness_spec("Lamp lounge=50%").unwrap(),
            ("Lamp lounge".to_string(), 50.0)
        );
        assert_eq!(
            parse_brightness_spec(" Lamp = 72.5 ").unwrap(),
            ("Lamp".to_string(), 72.5)
        );
        assert_eq!(
            parse_brightness_spec("Lamp").unwrap_err(),
            EditError::BrightnessFormat("Lamp".into())
        );
        assert_eq!(
            parse_brightness_spec("Lamp=bright").unwrap_err(),
            EditError::BrightnessValue("bright".into())
        );
        assert_eq!(
            parse_brightness_spec("Lamp=150%").unwrap_err(),
            EditError::BrightnessRange(150.0)
        );
    }

    #[test]
    fn out_of_range_spec_rejects_whole_batch() {
        // The bad spec comes after valid ones; nothing may be resolved.
        let lights = vec![light("l1", "Lamp"), light("l2", "Strip")];
        let specs = vec![
            EditSpec::TurnOff("Strip".into()),
            EditSpec::Brightness("Lamp=150%".into()),
        ];
        assert_eq!(
            resolve_edits(&specs, &lights).unwrap_err(),
            EditError::BrightnessRange(150.0)
        );
    }

    #[test]
    fn unknown_light_rejects_whole_batch_with_suggestions() {
        let lights = vec![light("l1", "Lamp lounge")];
        let specs = vec![EditSpec::TurnOn("Lamp luonge".into())];
        match resolve_edits(&specs, &lights).unwrap_err() {
            EditError::LightNotFound { query, suggestions } => {
                assert_eq!(query, "Lamp luonge");
                assert_eq!(suggestions, vec!["Lamp lounge".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ambiguous_light_name_lists_matches() {
        let lights = vec![light("l1", "Desk left"), light("l2", "Desk right")];
        let specs = vec![EditSpec::TurnOff("desk".into())];
        match resolve_edits(&specs, &lights).unwrap_err() {
            EditError::AmbiguousLight { matches, .. } => {
                assert_eq!(matches, vec!["Desk left", "Desk right"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn turn_off_clears_colour_and_dimming() {
        let actions = vec![action_on("l1", 80.0)];
        let edits = vec![edit(EditOp::TurnOff, "l1", "Lamp")];
        let outcome = apply_edits(&actions, &edits, RemovePolicy::Delete).unwrap();
        assert!(outcome.modified);
        let state = &outcome.actions[0].action;
        assert_eq!(state.on, Some(OnState { on: false }));
        assert!(state.dimming.is_none());
        assert!(state.color.is_none());
        assert!(state.color_temperature.is_none());
    }

    #[test]
    fn turn_off_appends_minimal_action_for_absent_light() {
        let actions = vec![action_on("l1", 80.0)];
        let edits = vec![edit(EditOp::TurnOff, "l2", "Strip")];
        let outcome = apply_edits(&actions, &edits, RemovePolicy::Delete).unwrap();
        assert_eq!(outcome.actions.len(), 2);
        assert_eq!(outcome.actions[1], SceneAction::off("l2"));
        assert_eq!(
            outcome.applied,
            vec![AppliedEdit::TurnedOff {
                light: "Strip".into(),
                added: true
            }]
        );
    }

    #[test]
    fn turn_on_keeps_existing_brightness_and_colour() {
        let mut actions = vec![action_on("l1", 80.0)];
        actions[0].action.on = Some(OnState { on: false });
        let edits = vec![edit(EditOp::TurnOn, "l1", "Lamp")];
        let outcome = apply_edits(&actions, &edits, RemovePolicy::Delete).unwrap();
        let state = &outcome.actions[0].action;
        assert_eq!(state.on, Some(OnState { on: true }));
        assert_eq!(state.dimming, Some(Dimming { brightness: 80.0 }));
        assert!(state.color.is_some());
    }

    #[test]
    fn turn_on_appends_full_brightness_for_absent_light() {
        let edits = vec![edit(EditOp::TurnOn, "l2", "Strip")];
        let outcome = apply_edits(&[], &edits, RemovePolicy::Delete).unwrap();
        assert_eq!(outcome.actions, vec![SceneAction::on_full("l2")]);
    }

    #[test]
    fn brightness_defaults_on_state_to_true() {
        let actions = vec![SceneAction {
            target: crate::model::ResourceRef::light("l1"),
            action: ActionState::default(),
        }];
        let edits = vec![edit(EditOp::Brightness(40.0), "l1", "Lamp")];
        let outcome = apply_edits(&actions, &edits, RemovePolicy::Delete).unwrap();
        let state = &outcome.actions[0].action;
        assert_eq!(state.on, Some(OnState { on: true }));
        assert_eq!(state.dimming, Some(Dimming { brightness: 40.0 }));
    }

    #[test]
    fn brightness_on_absent_light_is_a_precondition_error() {
        let edits = vec![edit(EditOp::Brightness(40.0), "l9", "Lamp")];
        assert_eq!(
            apply_edits(&[], &edits, RemovePolicy::Delete).unwrap_err(),
            EditError::LightNotInScene("Lamp".into())
        );
    }

    #[test]
    fn remove_deletes_entry_under_delete_policy() {
        let actions = vec![action_on("l1", 80.0), action_on("l2", 50.0)];
        let edits = vec![edit(EditOp::Remove, "l1", "Lamp")];
        let outcome = apply_edits(&actions, &edits, RemovePolicy::Delete).unwrap();
        assert_eq!(outcome.actions.len(), 1);
        assert_eq!(outcome.actions[0].target.rid, "l2");
        assert!(outcome.modified);
    }

    #[test]
    fn remove_of_absent_light_is_a_logged_noop() {
        let edits = vec![edit(EditOp::Remove, "l9", "Ghost")];
        let outcome = apply_edits(&[], &edits, RemovePolicy::Delete).unwrap();
        assert!(!outcome.modified);
        assert_eq!(
            outcome.applied,
            vec![AppliedEdit::RemoveSkipped {
                light: "Ghost".into()
            }]
        );
    }

    #[test]
    fn remove_turns_light_off_under_turn_off_policy() {
        let actions = vec![action_on("l1", 80.0)];
        let edits = vec![edit(EditOp::Remove, "l1", "Lamp")];
        let outcome = apply_edits(&actions, &edits, RemovePolicy::TurnOff).unwrap();
        assert_eq!(outcome.actions.len(), 1);
        assert_eq!(outcome.actions[0].action, ActionState::off());
    }

    #[test]
    fn remove_under_turn_off_policy_skips_absent_light_silently() {
        let edits = vec![edit(EditOp::Remove, "l9", "Ghost")];
        let outcome = apply_edits(&[], &edits, RemovePolicy::TurnOff).unwrap();
        assert!(!outcome.modified);
        assert!(outcome.actions.is_empty());
        assert!(outcome.applied.is_empty());
    }

    #[test]
    fn empty_edit_list_reports_unmodified() {
        let actions = vec![action_on("l1", 80.0)];
        let outcome = apply_edits(&actions, &[], RemovePolicy::Delete).unwrap();
        assert!(!outcome.modified);
        assert_eq!(outcome.actions, actions);
    }
}
