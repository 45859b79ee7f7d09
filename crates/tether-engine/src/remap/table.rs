//! Remap entries and the frozen lookup table

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::signature::MemberSignature;
use crate::version::{VersionRange, VersionTag};

/// Result type for remap operations
pub type RemapResult<T> = Result<T, RemapError>;

/// Errors raised while registering or walking remaps
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemapError {
    /// Entries renaming at the same version disagree on the next signature
    #[error("Ambiguous remap of {owner}::{member} at {version}: {candidates:?}")]
    Ambiguous {
        /// Logical owner type
        owner: String,
        /// Signature being remapped
        member: String,
        /// Version step with conflicting entries
        version: String,
        /// Conflicting destination signatures
        candidates: Vec<String>,
    },

    /// The chain revisits a state or does not terminate
    #[error("Remap cycle for {owner}::{member} at {version}")]
    Cycle {
        /// Logical owner type
        owner: String,
        /// Signature being remapped
        member: String,
        /// Version where the cycle was detected
        version: String,
    },

    /// Range start is not strictly before its end
    #[error("Invalid remap range {from} -> {to} for {owner}::{member}")]
    InvalidRange {
        /// Logical owner type
        owner: String,
        /// Remapped signature
        member: String,
        /// Range start
        from: String,
        /// Range end
        to: String,
    },

    /// Class rename with an empty range or no change of name
    #[error("Invalid class remap {from} -> {to} over {range}")]
    InvalidClassRemap {
        /// Class path before the rename
        from: String,
        /// Class path after the rename
        to: String,
        /// Releases the rename spans
        range: String,
    },

    /// Class renames at the same version disagree on the next path
    #[error("Ambiguous class remap of {class} at {version}: {candidates:?}")]
    AmbiguousClass {
        /// Class path being remapped
        class: String,
        /// Version with conflicting entries
        version: String,
        /// Conflicting destination paths
        candidates: Vec<String>,
    },

    /// Class rename chain revisits a path
    #[error("Class remap cycle for {class} at {version}")]
    ClassCycle {
        /// Class path being remapped
        class: String,
        /// Version where the cycle was detected
        version: String,
    },

    /// Source and destination describe different kinds of member
    #[error("Remap of {owner}::{member} changes the member kind")]
    KindMismatch {
        /// Logical owner type
        owner: String,
        /// Remapped signature
        member: String,
    },
}

/// One rename between two releases
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemapEntry {
    /// Logical owner type (the template name)
    pub owner: Arc<str>,
    /// Signature at `range.from`
    pub from: MemberSignature,
    /// Member name at `range.to`
    pub to_name: Arc<str>,
    /// Signature at `range.to`
    pub to_signature: MemberSignature,
    /// Releases the rename spans
    pub range: VersionRange,
}

impl RemapEntry {
    /// A rename keeping the signature's types
    pub fn rename(owner: &str, from: MemberSignature, to_name: &str, range: VersionRange) -> Self {
        let to_signature = from.renamed(to_name);
        Self {
            owner: Arc::from(owner),
            from,
            to_name: Arc::from(to_name),
            to_signature,
            range,
        }
    }

    /// A change to an arbitrary destination signature
    pub fn new(owner: &str, from: MemberSignature, to_signature: MemberSignature, range: VersionRange) -> Self {
        Self {
            owner: Arc::from(owner),
            from,
            to_name: to_signature.name.clone(),
            to_signature,
            range,
        }
    }

    fn validate(&self) -> RemapResult<()> {
        if self.range.from >= self.range.to {
            return Err(RemapError::InvalidRange {
                owner: self.owner.to_string(),
                member: self.from.to_string(),
                from: self.range.from.to_string(),
                to: self.range.to.to_string(),
            });
        }
        if self.from.kind != self.to_signature.kind {
            return Err(RemapError::KindMismatch {
                owner: self.owner.to_string(),
                member: self.from.to_string(),
            });
        }
        Ok(())
    }
}

/// A class moved to a new path between two releases
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassRemap {
    /// Class path before `range.to`
    pub from: Arc<str>,
    /// Class path from `range.to` on
    pub to: Arc<str>,
    /// Releases the rename spans
    pub range: VersionRange,
}

impl ClassRemap {
    /// Rename `from` to `to` at the end of `range`
    pub fn new(from: &str, to: &str, range: VersionRange) -> Self {
        Self {
            from: Arc::from(from),
            to: Arc::from(to),
            range,
        }
    }

    fn validate(&self) -> RemapResult<()> {
        if self.range.from >= self.range.to || self.from == self.to || self.to.is_empty() {
            return Err(RemapError::InvalidClassRemap {
                from: self.from.to_string(),
                to: self.to.to_string(),
                range: self.range.to_string(),
            });
        }
        Ok(())
    }
}

/// Result of a remap lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remapped {
    /// Signature to probe on the target
    pub signature: MemberSignature,
    /// Number of entries applied
    pub steps: usize,
}

impl Remapped {
    /// Name to probe on the target
    pub fn name(&self) -> &str {
        &self.signature.name
    }
}

type EntryIndex = FxHashMap<Arc<str>, FxHashMap<MemberSignature, Vec<Arc<RemapEntry>>>>;
type ClassIndex = FxHashMap<Arc<str>, Vec<Arc<ClassRemap>>>;

/// Collects entries during initialization
#[derive(Debug, Default)]
pub struct RemapTableBuilder {
    entries: Vec<Arc<RemapEntry>>,
    seen: FxHashSet<RemapEntry>,
    classes: Vec<Arc<ClassRemap>>,
    seen_classes: FxHashSet<ClassRemap>,
}

impl RemapTableBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entry. Exact duplicates are collapsed.
    pub fn register(&mut self, entry: RemapEntry) -> RemapResult<()> {
        entry.validate()?;
        if self.seen.insert(entry.clone()) {
            self.entries.push(Arc::new(entry));
        }
        Ok(())
    }

    /// Register several entries
    pub fn register_all(&mut self, entries: impl IntoIterator<Item = RemapEntry>) -> RemapResult<()> {
        for entry in entries {
            self.register(entry)?;
        }
        Ok(())
    }

    /// Register a class rename. Exact duplicates are collapsed.
    pub fn register_class(&mut self, entry: ClassRemap) -> RemapResult<()> {
        entry.validate()?;
        if self.seen_classes.insert(entry.clone()) {
            self.classes.push(Arc::new(entry));
        }
        Ok(())
    }

    /// Register several class renames
    pub fn register_classes(&mut self, entries: impl IntoIterator<Item = ClassRemap>) -> RemapResult<()> {
        for entry in entries {
            self.register_class(entry)?;
        }
        Ok(())
    }

    /// Number of registered member and class entries
    pub fn len(&self) -> usize {
        self.entries.len() + self.classes.len()
    }

    /// Check if no entries are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.classes.is_empty()
    }

    /// Freeze into a read-only table
    pub fn build(self) -> RemapTable {
        let mut forward: EntryIndex = FxHashMap::default();
        let mut reverse: EntryIndex = FxHashMap::default();
        let mut versions = FxHashSet::default();

        for entry in &self.entries {
            versions.insert(entry.range.from.clone());
            versions.insert(entry.range.to.clone());
            forward
                .entry(entry.owner.clone())
                .or_default()
                .entry(entry.from.clone())
                .or_default()
                .push(entry.clone());
            reverse
                .entry(entry.owner.clone())
                .or_default()
                .entry(entry.to_signature.clone())
                .or_default()
                .push(entry.clone());
        }

        let mut class_forward: ClassIndex = FxHashMap::default();
        let mut class_reverse: ClassIndex = FxHashMap::default();
        for entry in &self.classes {
            versions.insert(entry.range.from.clone());
            versions.insert(entry.range.to.clone());
            class_forward.entry(entry.from.clone()).or_default().push(entry.clone());
            class_reverse.entry(entry.to.clone()).or_default().push(entry.clone());
        }

        for lists in forward.values_mut().chain(reverse.values_mut()) {
            for list in lists.values_mut() {
                list.sort_by(|a, b| {
                    a.range
                        .from
                        .cmp(&b.range.from)
                        .then_with(|| a.range.to.cmp(&b.range.to))
                });
            }
        }

        RemapTable {
            forward,
            reverse,
            class_forward,
            class_reverse,
            entry_count: self.entries.len() + self.classes.len(),
            version_count: versions.len(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn between(declared: &VersionTag, target: &VersionTag) -> Option<Self> {
        match declared.cmp(target) {
            Ordering::Equal => None,
            Ordering::Less => Some(Direction::Forward),
            Ordering::Greater => Some(Direction::Backward),
        }
    }

    /// A rename takes effect at `point`. Walking forward, every point in
    /// (version, target] applies; walking back, every point in
    /// (target, version] is undone, the declared version itself included.
    fn crosses(self, point: &VersionTag, version: &VersionTag, target: &VersionTag, first: bool) -> bool {
        match self {
            Direction::Forward => point > version && point <= target,
            Direction::Backward => {
                let reached = if first { point <= version } else { point < version };
                reached && point > target
            }
        }
    }

    /// Nearest rename point in walking order
    fn nearest<'a>(self, points: impl Iterator<Item = &'a VersionTag>) -> Option<&'a VersionTag> {
        match self {
            Direction::Forward => points.min(),
            Direction::Backward => points.max(),
        }
    }
}

/// Read-only remap table
#[derive(Debug, Default)]
pub struct RemapTable {
    forward: EntryIndex,
    reverse: EntryIndex,
    class_forward: ClassIndex,
    class_reverse: ClassIndex,
    entry_count: usize,
    version_count: usize,
}

impl RemapTable {
    /// A table with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of member and class entries
    pub fn len(&self) -> usize {
        self.entry_count
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Find the signature `signature` (declared at `declared`) has at `target`
    ///
    /// Returns `None` when no rename applies and the declared signature is
    /// used unchanged.
    pub fn lookup(
        &self,
        owner: &str,
        signature: &MemberSignature,
        declared: &VersionTag,
        target: &VersionTag,
    ) -> RemapResult<Option<Remapped>> {
        let Some(direction) = Direction::between(declared, target) else {
            return Ok(None);
        };
        let index = match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.reverse,
        };
        let Some(by_signature) = index.get(owner) else {
            return Ok(None);
        };

        if let Some(direct) = self.direct(owner, by_signature, signature, declared, target, direction)? {
            tracing::debug!(owner, from = %signature, to = %direct.signature, "direct remap applied");
            return Ok(Some(direct));
        }

        let bound = self.version_count + 1;
        let mut visited: FxHashSet<(MemberSignature, VersionTag)> = FxHashSet::default();
        let mut current = signature.clone();
        let mut version = declared.clone();
        let mut steps = 0;

        visited.insert((current.clone(), version.clone()));
        loop {
            let candidates: Vec<&Arc<RemapEntry>> = by_signature
                .get(&current)
                .map(|list| {
                    list.iter()
                        .filter(|e| direction.crosses(&e.range.to, &version, target, steps == 0))
                        .collect()
                })
                .unwrap_or_default();

            let Some(point) = direction.nearest(candidates.iter().map(|e| &e.range.to)) else {
                break;
            };
            let step: Vec<&Arc<RemapEntry>> = candidates.iter().copied().filter(|e| &e.range.to == point).collect();

            let entry = self.agree(owner, &current, &step, direction)?;
            let next = match direction {
                Direction::Forward => entry.to_signature.clone(),
                Direction::Backward => entry.from.clone(),
            };
            let next_version = entry.range.to.clone();
            tracing::debug!(owner, from = %current, to = %next, version = %next_version, "remap step");

            steps += 1;
            if steps > bound || !visited.insert((next.clone(), next_version.clone())) {
                return Err(RemapError::Cycle {
                    owner: owner.to_string(),
                    member: signature.to_string(),
                    version: next_version.to_string(),
                });
            }
            current = next;
            version = next_version;
        }

        if steps == 0 {
            return Ok(None);
        }
        Ok(Some(Remapped {
            signature: restore_flags(current, signature),
            steps,
        }))
    }

    /// Find the path a class known as `path` at `declared` has at `target`
    ///
    /// Returns `None` when the class kept its path.
    pub fn lookup_class(&self, path: &str, declared: &VersionTag, target: &VersionTag) -> RemapResult<Option<Arc<str>>> {
        let Some(direction) = Direction::between(declared, target) else {
            return Ok(None);
        };
        let index = match direction {
            Direction::Forward => &self.class_forward,
            Direction::Backward => &self.class_reverse,
        };
        if index.is_empty() {
            return Ok(None);
        }

        let bound = self.version_count + 1;
        let mut visited: FxHashSet<(Arc<str>, VersionTag)> = FxHashSet::default();
        let mut current: Arc<str> = Arc::from(path);
        let mut version = declared.clone();
        let mut steps = 0;

        visited.insert((current.clone(), version.clone()));
        while let Some(list) = index.get(&*current) {
            let candidates: Vec<&Arc<ClassRemap>> = list
                .iter()
                .filter(|e| direction.crosses(&e.range.to, &version, target, steps == 0))
                .collect();
            let Some(point) = direction.nearest(candidates.iter().map(|e| &e.range.to)) else {
                break;
            };

            let destination = |e: &ClassRemap| match direction {
                Direction::Forward => e.to.clone(),
                Direction::Backward => e.from.clone(),
            };
            let mut next: Vec<Arc<str>> = candidates
                .iter()
                .filter(|e| &e.range.to == point)
                .map(|e| destination(e))
                .collect();
            next.sort();
            next.dedup();
            if next.len() > 1 {
                return Err(RemapError::AmbiguousClass {
                    class: current.to_string(),
                    version: point.to_string(),
                    candidates: next.iter().map(|p| p.to_string()).collect(),
                });
            }
            let next = next.remove(0);
            let next_version = point.clone();
            tracing::debug!(from = &*current, to = &*next, version = %next_version, "class remap step");

            steps += 1;
            if steps > bound || !visited.insert((next.clone(), next_version.clone())) {
                return Err(RemapError::ClassCycle {
                    class: path.to_string(),
                    version: next_version.to_string(),
                });
            }
            current = next;
            version = next_version;
        }

        Ok((steps > 0).then_some(current))
    }

    fn direct(
        &self,
        owner: &str,
        by_signature: &FxHashMap<MemberSignature, Vec<Arc<RemapEntry>>>,
        signature: &MemberSignature,
        declared: &VersionTag,
        target: &VersionTag,
        direction: Direction,
    ) -> RemapResult<Option<Remapped>> {
        let Some(list) = by_signature.get(signature) else {
            return Ok(None);
        };
        let matching: Vec<&Arc<RemapEntry>> = list
            .iter()
            .filter(|e| match direction {
                Direction::Forward => &e.range.from == declared && &e.range.to == target,
                Direction::Backward => &e.range.to == declared && &e.range.from == target,
            })
            .collect();
        if matching.is_empty() {
            return Ok(None);
        }
        let entry = self.agree(owner, signature, &matching, direction)?;
        let next = match direction {
            Direction::Forward => entry.to_signature.clone(),
            Direction::Backward => entry.from.clone(),
        };
        Ok(Some(Remapped {
            signature: restore_flags(next, signature),
            steps: 1,
        }))
    }

    /// Pick the single destination of a version step, or report the conflict
    fn agree<'a>(
        &self,
        owner: &str,
        current: &MemberSignature,
        step: &[&'a Arc<RemapEntry>],
        direction: Direction,
    ) -> RemapResult<&'a Arc<RemapEntry>> {
        let destination = |e: &RemapEntry| match direction {
            Direction::Forward => e.to_signature.clone(),
            Direction::Backward => e.from.clone(),
        };
        let first = step[0];
        let first_dest = destination(first);
        let conflicting: Vec<String> = step
            .iter()
            .map(|e| destination(e))
            .filter(|d| d != &first_dest)
            .map(|d| d.to_string())
            .collect();
        if !conflicting.is_empty() {
            let mut candidates = vec![first_dest.to_string()];
            candidates.extend(conflicting);
            candidates.dedup();
            return Err(RemapError::Ambiguous {
                owner: owner.to_string(),
                member: current.to_string(),
                version: first.range.to.to_string(),
                candidates,
            });
        }
        Ok(first)
    }
}

/// Keep the declared staticness and optionality on a remapped signature
fn restore_flags(mut remapped: MemberSignature, declared: &MemberSignature) -> MemberSignature {
    remapped.is_static = declared.is_static;
    remapped.is_optional = declared.is_optional;
    remapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{PrimitiveType, TypeRef};

    fn v(s: &str) -> VersionTag {
        VersionTag::parse(s).unwrap()
    }

    fn getter(name: &str) -> MemberSignature {
        MemberSignature::method(name, vec![], TypeRef::primitive(PrimitiveType::Int))
    }

    fn rename(from: &str, to: &str, a: &str, b: &str) -> RemapEntry {
        RemapEntry::rename("Point", getter(from), to, VersionRange::parse(a, b).unwrap())
    }

    fn table(entries: Vec<RemapEntry>) -> RemapTable {
        let mut builder = RemapTableBuilder::new();
        builder.register_all(entries).unwrap();
        builder.build()
    }

    #[test]
    fn test_identity_when_versions_match() {
        let t = table(vec![rename("getX", "getXCoord", "1.0", "2.0")]);
        assert_eq!(t.lookup("Point", &getter("getX"), &v("1.0"), &v("1.0")).unwrap(), None);
    }

    #[test]
    fn test_direct_entry() {
        let t = table(vec![rename("getX", "getXCoord", "1.0", "2.0")]);
        let r = t.lookup("Point", &getter("getX"), &v("1.0"), &v("2.0")).unwrap().unwrap();
        assert_eq!(r.name(), "getXCoord");
        assert_eq!(r.steps, 1);
    }

    #[test]
    fn test_no_entry_for_owner_or_member() {
        let t = table(vec![rename("getX", "getXCoord", "1.0", "2.0")]);
        assert_eq!(t.lookup("Line", &getter("getX"), &v("1.0"), &v("2.0")).unwrap(), None);
        assert_eq!(t.lookup("Point", &getter("getY"), &v("1.0"), &v("2.0")).unwrap(), None);
    }

    #[test]
    fn test_declared_inside_range() {
        let t = table(vec![rename("a", "b", "1.0", "2.0")]);
        let r = t.lookup("Point", &getter("a"), &v("1.5"), &v("2.0")).unwrap().unwrap();
        assert_eq!(r.name(), "b");
        // Not yet renamed at 1.8
        assert_eq!(t.lookup("Point", &getter("a"), &v("1.5"), &v("1.8")).unwrap(), None);
    }

    #[test]
    fn test_backward_into_range() {
        let t = table(vec![rename("a", "b", "1.0", "2.0")]);
        let r = t.lookup("Point", &getter("b"), &v("2.5"), &v("1.5")).unwrap().unwrap();
        assert_eq!(r.name(), "a");
        assert_eq!(t.lookup("Point", &getter("b"), &v("3.0"), &v("2.0")).unwrap(), None);
    }

    #[test]
    fn test_simultaneous_renames_do_not_chain() {
        let t = table(vec![
            rename("a", "b", "1.0", "2.0"),
            rename("b", "c", "1.5", "2.0"),
        ]);
        let r = t.lookup("Point", &getter("a"), &v("1.0"), &v("3.0")).unwrap().unwrap();
        assert_eq!(r.name(), "b");
        assert_eq!(r.steps, 1);
    }

    fn class_table(entries: Vec<ClassRemap>) -> RemapTable {
        let mut builder = RemapTableBuilder::new();
        builder.register_classes(entries).unwrap();
        builder.build()
    }

    #[test]
    fn test_class_path_chain() {
        let t = class_table(vec![
            ClassRemap::new("ui.Widget", "ui.Control", VersionRange::parse("1.0", "2.0").unwrap()),
            ClassRemap::new("ui.Control", "ui.base.Control", VersionRange::parse("2.0", "3.0").unwrap()),
        ]);
        let forward = t.lookup_class("ui.Widget", &v("1.0"), &v("3.0")).unwrap();
        assert_eq!(forward.as_deref(), Some("ui.base.Control"));
        let partial = t.lookup_class("ui.Widget", &v("1.5"), &v("2.5")).unwrap();
        assert_eq!(partial.as_deref(), Some("ui.Control"));
        let backward = t.lookup_class("ui.base.Control", &v("3.0"), &v("1.0")).unwrap();
        assert_eq!(backward.as_deref(), Some("ui.Widget"));
        assert_eq!(t.lookup_class("ui.Widget", &v("1.0"), &v("1.9")).unwrap(), None);
        assert_eq!(t.lookup_class("ui.Label", &v("1.0"), &v("3.0")).unwrap(), None);
    }

    #[test]
    fn test_class_path_conflicts() {
        let t = class_table(vec![
            ClassRemap::new("ui.Widget", "ui.Control", VersionRange::parse("1.0", "2.0").unwrap()),
            ClassRemap::new("ui.Widget", "ui.View", VersionRange::parse("1.5", "2.0").unwrap()),
        ]);
        match t.lookup_class("ui.Widget", &v("1.0"), &v("2.0")).unwrap_err() {
            RemapError::AmbiguousClass { candidates, .. } => assert_eq!(candidates, vec!["ui.Control", "ui.View"]),
            other => panic!("unexpected error: {:?}", other),
        }

        let mut builder = RemapTableBuilder::new();
        let same = ClassRemap::new("ui.Widget", "ui.Widget", VersionRange::parse("1.0", "2.0").unwrap());
        assert!(matches!(builder.register_class(same), Err(RemapError::InvalidClassRemap { .. })));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_chain_stops_at_target() {
        let t = table(vec![
            rename("a", "b", "1.0", "2.0"),
            rename("b", "c", "2.0", "3.0"),
        ]);
        let r = t.lookup("Point", &getter("a"), &v("1.0"), &v("2.5")).unwrap().unwrap();
        assert_eq!(r.name(), "b");
    }

    #[test]
    fn test_backward_direct() {
        let t = table(vec![rename("getX", "getXCoord", "1.0", "2.0")]);
        let r = t.lookup("Point", &getter("getXCoord"), &v("2.0"), &v("1.0")).unwrap().unwrap();
        assert_eq!(r.name(), "getX");
    }

    #[test]
    fn test_ambiguous_step() {
        let t = table(vec![
            rename("a", "b", "1.0", "2.0"),
            rename("a", "c", "1.0", "2.0"),
        ]);
        let err = t.lookup("Point", &getter("a"), &v("1.0"), &v("2.0")).unwrap_err();
        assert!(matches!(err, RemapError::Ambiguous { .. }));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut builder = RemapTableBuilder::new();
        let entry = RemapEntry {
            owner: Arc::from("Point"),
            from: getter("a"),
            to_name: Arc::from("b"),
            to_signature: getter("b"),
            range: VersionRange {
                from: v("2.0"),
                to: v("1.0"),
            },
        };
        assert!(matches!(builder.register(entry), Err(RemapError::InvalidRange { .. })));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let mut builder = RemapTableBuilder::new();
        let entry = RemapEntry::new(
            "Point",
            getter("x"),
            MemberSignature::field("x", TypeRef::primitive(PrimitiveType::Int)),
            VersionRange::parse("1.0", "2.0").unwrap(),
        );
        assert!(matches!(builder.register(entry), Err(RemapError::KindMismatch { .. })));
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut builder = RemapTableBuilder::new();
        builder.register(rename("a", "b", "1.0", "2.0")).unwrap();
        builder.register(rename("a", "b", "1.0", "2.0")).unwrap();
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_flags_follow_declaration() {
        let t = table(vec![rename("count", "size", "1.0", "2.0")]);
        let declared = getter("count").with_static(true).with_optional(true);
        let r = t.lookup("Point", &declared, &v("1.0"), &v("2.0")).unwrap().unwrap();
        assert!(r.signature.is_static);
        assert!(r.signature.is_optional);
    }
}
