//! Grouping of entrypoints into build units.
//!
//! Scripts injected into pages (content scripts) and standalone scripts and
//! styles are built on their own. Extension pages share one ES-module unit,
//! and so does an ES-module background. Sandboxed pages get a separate
//! shared unit since they run under their own content-security policy.

use crate::entrypoints::{Entrypoint, EntrypointType};

#[derive(Debug, Clone, PartialEq)]
pub enum EntrypointGroup {
    /// Built in isolation.
    Single(Entrypoint),
    /// Built together as one bundling unit.
    Shared(Vec<Entrypoint>),
}

impl EntrypointGroup {
    pub fn entrypoints(&self) -> &[Entrypoint] {
        match self {
            Self::Single(entry) => std::slice::from_ref(entry),
            Self::Shared(entries) => entries,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entrypoints().iter().map(|e| e.name.as_str()).collect()
    }

    /// Entrypoint names joined for messages, e.g. `popup, options`.
    pub fn label(&self) -> String {
        self.names().join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Individual,
    Esm,
    SandboxedEsm,
}

fn group_kind(entry: &Entrypoint) -> GroupKind {
    match entry.entrypoint_type() {
        EntrypointType::Background => {
            if entry.background_options().is_some_and(|o| o.is_module()) {
                GroupKind::Esm
            } else {
                GroupKind::Individual
            }
        }
        EntrypointType::ContentScript
        | EntrypointType::ContentScriptStyle
        | EntrypointType::UnlistedScript
        | EntrypointType::UnlistedStyle => GroupKind::Individual,
        EntrypointType::Sandbox => GroupKind::SandboxedEsm,
        EntrypointType::Popup
        | EntrypointType::Options
        | EntrypointType::Sidepanel
        | EntrypointType::Newtab
        | EntrypointType::History
        | EntrypointType::Devtools
        | EntrypointType::Bookmarks
        | EntrypointType::UnlistedPage => GroupKind::Esm,
    }
}

/// Bucket `entrypoints` into build groups, dropping skipped ones.
///
/// Each shared group sits at the position of its first member; members keep
/// discovery order.
pub fn group_entrypoints(entrypoints: &[Entrypoint]) -> Vec<EntrypointGroup> {
    let mut groups: Vec<EntrypointGroup> = Vec::new();
    let mut esm_index: Option<usize> = None;
    let mut sandbox_index: Option<usize> = None;

    for entry in entrypoints.iter().filter(|e| !e.skipped) {
        let slot = match group_kind(entry) {
            GroupKind::Individual => {
                groups.push(EntrypointGroup::Single(entry.clone()));
                continue;
            }
            GroupKind::Esm => &mut esm_index,
            GroupKind::SandboxedEsm => &mut sandbox_index,
        };

        match *slot {
            Some(index) => {
                if let EntrypointGroup::Shared(members) = &mut groups[index] {
                    members.push(entry.clone());
                }
            }
            None => {
                *slot = Some(groups.len());
                groups.push(EntrypointGroup::Shared(vec![entry.clone()]));
            }
        }
    }

    groups
}
