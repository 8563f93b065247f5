//! Name resolution for user-supplied scene/room/zone/light names.
//!
//! Matching cascade: exact (case-insensitive), then substring, then ranked
//! suggestions. Callers must branch on the three outcomes; ambiguity is
//! never auto-picked.

use crate::model::{GroupedEntity, Light, Scene};

/// Anything resolvable by name.
pub trait Named {
    fn name(&self) -> &str;

    /// Disambiguation hint shown next to ambiguous matches, e.g. the rid of
    /// the group a scene belongs to.
    fn group_hint(&self) -> Option<&str> {
        None
    }
}

impl Named for Light {
    fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl Named for GroupedEntity {
    fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl Named for Scene {
    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn group_hint(&self) -> Option<&str> {
        Some(&self.group.rid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a, T> {
    Unique(&'a T),
    Ambiguous(Vec<&'a T>),
    NotFound(Vec<String>),
}

/// Resolve `query` against `candidates`. Scope filtering (e.g. restricting
/// scenes to one zone) is the caller's job, done before calling this.
pub fn resolve<'a, T: Named>(query: &str, candidates: &[&'a T]) -> Resolution<'a, T> {
    let needle = query.to_lowercase();

    let exact: Vec<&T> = candidates
        .iter()
        .copied()
        .filter(|c| c.name().to_lowercase() == needle)
        .collect();
    match exact.len() {
        1 => return Resolution::Unique(exact[0]),
        n if n > 1 => return Resolution::Ambiguous(exact),
        _ => {}
    }

    let partial: Vec<&T> = candidates
        .iter()
        .copied()
        .filter(|c| c.name().to_lowercase().contains(&needle))
        .collect();
    match partial.len() {
        1 => return Resolution::Unique(partial[0]),
        n if n > 1 => return Resolution::Ambiguous(partial),
        _ => {}
    }

    Resolution::NotFound(similar_names(
        query,
        candidates.iter().map(|c| c.name()),
    ))
}

const SUGGESTION_THRESHOLD: f64 = 0.3;
const MAX_SUGGESTIONS: usize = 5;

/// Candidate names ranked by similarity to `query`, best first.
pub fn similar_names<'a>(query: &str, names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let needle = query.to_lowercase();
    let mut scored: Vec<(f64, String)> = names
        .map(|name| {
            (
                strsim::jaro_winkler(&needle, &name.to_lowercase()),
                name.to_string(),
            )
        })
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name)
        .collect()
}
