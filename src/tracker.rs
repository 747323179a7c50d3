//! State threaded through an expansion: the import stack used for cycle
//! detection, the two include-guard sets, and the record of expanded files.

use std::collections::{HashMap, HashSet};
use std::fmt;

use sha2::{Digest, Sha256};

use crate::ResolvedIncludePath;

/// Files currently being expanded, outermost first.
#[derive(Clone, Default, Debug)]
pub struct ImportStack {
    frames: Vec<ResolvedIncludePath>,
}

impl ImportStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `path`, unless it is already being expanded. In that case the
    /// cycle is returned instead: every frame from the first occurrence of
    /// `path` onward, followed by `path` again.
    pub fn push(&mut self, path: ResolvedIncludePath) -> Result<(), Vec<ResolvedIncludePath>> {
        if let Some(first) = self.frames.iter().position(|frame| *frame == path) {
            let mut chain = self.frames[first..].to_vec();
            chain.push(path);
            return Err(chain);
        }

        self.frames.push(path);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<ResolvedIncludePath> {
        self.frames.pop()
    }

    pub fn contains(&self, path: &ResolvedIncludePath) -> bool {
        self.frames.contains(path)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedIncludePath> {
        self.frames.iter()
    }
}

/// Files which carried the once directive and have already been expanded.
#[derive(Clone, Default, Debug)]
pub struct OnceGuardSet(HashSet<ResolvedIncludePath>);

impl OnceGuardSet {
    /// Returns `false` if `path` was already recorded.
    pub fn insert(&mut self, path: ResolvedIncludePath) -> bool {
        self.0.insert(path)
    }

    pub fn contains(&self, path: &ResolvedIncludePath) -> bool {
        self.0.contains(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Names declared through the `#ifndef NAME` / `#define NAME` idiom.
#[derive(Clone, Default, Debug)]
pub struct NamedGuardSet(HashSet<String>);

impl NamedGuardSet {
    /// Returns `false` if `name` was already recorded.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// SHA-256 of an expanded file body.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Fingerprint(hasher.finalize().into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Files already inlined during this run, in the order they finished.
/// Only used to decide between inlining and emitting a dedup marker.
#[derive(Clone, Default, Debug)]
pub struct ExpansionRecord {
    fingerprints: HashMap<ResolvedIncludePath, Fingerprint>,
    order: Vec<ResolvedIncludePath>,
}

impl ExpansionRecord {
    pub fn record(&mut self, path: ResolvedIncludePath, expanded: &str) {
        let fingerprint = Fingerprint::of(expanded);
        if self.fingerprints.insert(path.clone(), fingerprint).is_none() {
            self.order.push(path);
        }
    }

    pub fn contains(&self, path: &ResolvedIncludePath) -> bool {
        self.fingerprints.contains_key(path)
    }

    pub fn fingerprint(&self, path: &ResolvedIncludePath) -> Option<Fingerprint> {
        self.fingerprints.get(path).copied()
    }

    /// Expanded files, in completion order.
    pub fn files(&self) -> &[ResolvedIncludePath] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Non-fatal authoring problem found while expanding
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub file: ResolvedIncludePath,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): {}", self.file, self.line, self.message)
    }
}

/// Everything which outlives a single file's expansion. Guards and the
/// expansion record only grow; start over with a fresh state to forget them.
#[derive(Clone, Default, Debug)]
pub struct ExpansionState {
    pub(crate) once_guards: OnceGuardSet,
    pub(crate) named_guards: NamedGuardSet,
    pub(crate) record: ExpansionRecord,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn once_guards(&self) -> &OnceGuardSet {
        &self.once_guards
    }

    pub fn named_guards(&self) -> &NamedGuardSet {
        &self.named_guards
    }

    pub fn record(&self) -> &ExpansionRecord {
        &self.record
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> ResolvedIncludePath {
        ResolvedIncludePath::new(p)
    }

    #[test]
    fn stack_reports_cycle_from_first_occurrence() {
        let mut stack = ImportStack::new();
        stack.push(path("top.glsl")).unwrap();
        stack.push(path("a.glsl")).unwrap();
        stack.push(path("b.glsl")).unwrap();

        assert_eq!(
            stack.push(path("a.glsl")),
            Err(vec![path("a.glsl"), path("b.glsl"), path("a.glsl")])
        );
        assert_eq!(stack.len(), 3);

        assert_eq!(stack.pop(), Some(path("b.glsl")));
        assert!(stack.push(path("b.glsl")).is_ok());
    }

    #[test]
    fn record_keeps_completion_order() {
        let mut record = ExpansionRecord::default();
        record.record(path("b.glsl"), "int b;");
        record.record(path("a.glsl"), "int a;");
        record.record(path("b.glsl"), "int b;");

        assert_eq!(record.files(), &[path("b.glsl"), path("a.glsl")]);
        assert_eq!(
            record.fingerprint(&path("a.glsl")),
            Some(Fingerprint::of("int a;"))
        );
        assert!(!record.contains(&path("c.glsl")));
    }

    #[test]
    fn fingerprint_hex() {
        assert_eq!(
            Fingerprint::of("").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
