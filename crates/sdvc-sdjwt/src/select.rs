//! # Disclosure Selection
//!
//! Maps the claims a holder wants to reveal onto disclosure indices of an
//! [`IssuanceFormat`]. The signed payload is walked once from the root;
//! every digest it reaches (directly, or inside an already reached
//! disclosure) names its disclosure, which gets a path and a parent.
//!
//! Claims are addressed by path: segments joined with `/`, claim names
//! escaped as in RFC 6901 (`~` as `~0`, `/` as `~1`), array elements by
//! position. `address/locality` and `nationalities/1` are paths. A bare
//! name addresses the top-level claim of that name; only when no top-level
//! disclosure has it does the name match disclosures at any depth.
//!
//! Selecting a claim includes:
//!
//! - its own disclosure;
//! - every descendant, so a recursively blinded claim is revealed with its
//!   full value;
//! - every ancestor, so a verifier can walk from the signed payload down to
//!   it.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::disclosure::{array_slot_digest, Disclosure, SD_CLAIM};
use crate::error::SdJwtError;
use crate::issuance::IssuanceFormat;

/// Disclosure dependency graph of one issuance.
#[derive(Debug)]
pub struct DisclosureSelector<'a> {
    issuance: &'a IssuanceFormat,
    paths: Vec<Option<String>>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl<'a> DisclosureSelector<'a> {
    /// Index the disclosures of `issuance`.
    pub fn new(issuance: &'a IssuanceFormat) -> Result<Self, SdJwtError> {
        let algorithm = issuance.digest_algorithm()?;
        let payload = issuance.unverified_payload()?;
        let disclosures = issuance.disclosures();

        let mut index = PathIndex {
            disclosures,
            by_digest: disclosures
                .iter()
                .enumerate()
                .map(|(i, d)| (d.digest(algorithm), i))
                .collect(),
            paths: vec![None; disclosures.len()],
            parents: vec![None; disclosures.len()],
        };
        index.visit(&Value::Object(payload), "", None);

        let mut children = vec![Vec::new(); disclosures.len()];
        for (child, parent) in index.parents.iter().enumerate() {
            if let Some(parent) = parent {
                children[*parent].push(child);
            }
        }

        Ok(Self {
            issuance,
            paths: index.paths,
            parents: index.parents,
            children,
        })
    }

    /// Indices of the disclosures needed to reveal every claim in `names`.
    pub fn select<I, S>(&self, names: I) -> Result<BTreeSet<usize>, SdJwtError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            let matches = self.matches(name);
            if matches.is_empty() {
                return Err(SdJwtError::ClaimNotFound(name.to_string()));
            }
            for index in matches {
                self.add_descendants(index, &mut selected);
                self.add_ancestors(index, &mut selected);
            }
        }
        tracing::debug!(
            selected = selected.len(),
            total = self.issuance.disclosures().len(),
            "selected disclosures"
        );
        Ok(selected)
    }

    /// Path of the claim disclosed at `index`, if the payload reaches it.
    pub fn path(&self, index: usize) -> Option<&str> {
        self.paths.get(index)?.as_deref()
    }

    /// Parent disclosure of `index`, if it is nested.
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    fn matches(&self, term: &str) -> Vec<usize> {
        let exact: Vec<usize> = (0..self.paths.len())
            .filter(|&i| self.path(i) == Some(term))
            .collect();
        if !exact.is_empty() || term.contains('/') {
            return exact;
        }
        let disclosures = self.issuance.disclosures();
        (0..self.paths.len())
            .filter(|&i| self.paths[i].is_some() && disclosures[i].name() == Some(term))
            .collect()
    }

    fn add_descendants(&self, index: usize, selected: &mut BTreeSet<usize>) {
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            if selected.insert(i) {
                stack.extend(self.children[i].iter().copied());
            }
        }
    }

    fn add_ancestors(&self, index: usize, selected: &mut BTreeSet<usize>) {
        let mut current = self.parent(index);
        while let Some(i) = current {
            selected.insert(i);
            current = self.parent(i);
        }
    }
}

/// Walk state for assigning paths and parents.
struct PathIndex<'d> {
    disclosures: &'d [Disclosure],
    by_digest: HashMap<String, usize>,
    paths: Vec<Option<String>>,
    parents: Vec<Option<usize>>,
}

impl PathIndex<'_> {
    fn visit(&mut self, value: &Value, path: &str, parent: Option<usize>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if key == SD_CLAIM {
                        let digests = child.as_array().into_iter().flatten();
                        for digest in digests.filter_map(Value::as_str) {
                            self.open(digest, path, None, parent);
                        }
                    } else {
                        self.visit(child, &join(path, &escape(key)), parent);
                    }
                }
            }
            Value::Array(items) => {
                for (position, item) in items.iter().enumerate() {
                    match array_slot_digest(item) {
                        Some(digest) => self.open(digest, path, Some(position), parent),
                        None => self.visit(item, &join(path, &position.to_string()), parent),
                    }
                }
            }
            _ => {}
        }
    }

    /// Place the disclosure behind `digest` under `container`, then index
    /// its value.
    fn open(&mut self, digest: &str, container: &str, position: Option<usize>, parent: Option<usize>) {
        let Some(&index) = self.by_digest.get(digest) else {
            return;
        };
        if self.paths[index].is_some() {
            return;
        }
        let disclosures = self.disclosures;
        let disclosure = &disclosures[index];
        // A disclosure in the wrong kind of slot is never placed.
        let segment = match (position, disclosure.name()) {
            (None, Some(name)) => escape(name),
            (Some(position), None) => position.to_string(),
            _ => return,
        };
        let path = join(container, &segment);
        self.paths[index] = Some(path.clone());
        self.parents[index] = parent;
        self.visit(disclosure.value(), &path, Some(index));
    }
}

fn escape(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

fn join(container: &str, segment: &str) -> String {
    if container.is_empty() {
        segment.to_string()
    } else {
        format!("{container}/{segment}")
    }
}

/// Indices of the disclosures of `issuance` needed to reveal `names`.
pub fn select_disclosures<I, S>(
    issuance: &IssuanceFormat,
    names: I,
) -> Result<BTreeSet<usize>, SdJwtError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DisclosureSelector::new(issuance)?.select(names)
}
