//! The set of definitions one signature depends on, and their print order.

use std::collections::HashMap;

use super::DefHandle;

/// One step of the print order produced by [`DefinitionSet::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetItem {
    /// Print a forward declaration of the definition.
    Forward(DefHandle),
    /// Print the full definition.
    Definition {
        /// The definition
        handle: DefHandle,
        /// A forward declaration of this definition was printed earlier
        forward_declared: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    OnStack,
    ForwardYielded,
    Yielded,
}

#[derive(Debug)]
struct Entry {
    handle: DefHandle,
    forwardable: bool,
    dependencies: Vec<DefHandle>,
}

/// Insertion-ordered set of definitions with dependency edges.
#[derive(Debug, Default)]
pub struct DefinitionSet {
    entries: Vec<Entry>,
    positions: HashMap<DefHandle, usize>,
}

impl DefinitionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of definitions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the definition is part of the set.
    #[must_use]
    pub fn contains(&self, handle: DefHandle) -> bool {
        self.positions.contains_key(&handle)
    }

    /// Adds a definition; `forwardable` tells whether it can be forward declared.
    pub fn add(&mut self, handle: DefHandle, forwardable: bool) {
        if self.contains(handle) {
            return;
        }
        self.positions.insert(handle, self.entries.len());
        self.entries.push(Entry {
            handle,
            forwardable,
            dependencies: Vec::new(),
        });
    }

    /// Records that `parent` has to be printed after `child`.
    ///
    /// Self-dependencies are ignored, as is a `parent` outside of the set.
    pub fn add_dependency(&mut self, parent: DefHandle, child: DefHandle) {
        if parent == child {
            return;
        }
        if let Some(position) = self.positions.get(&parent) {
            self.entries[*position].dependencies.push(child);
        }
    }

    /// Orders the definitions for printing.
    ///
    /// Dependencies come before their dependents. When a cycle is found the definition that
    /// closes it is forward declared, provided its kind allows that.
    #[must_use]
    pub fn walk(&self) -> Vec<SetItem> {
        let mut states = HashMap::with_capacity(self.entries.len());
        let mut items = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            self.visit(entry.handle, &mut states, &mut items);
        }

        items
    }

    fn visit(
        &self,
        handle: DefHandle,
        states: &mut HashMap<DefHandle, WalkState>,
        items: &mut Vec<SetItem>,
    ) {
        let Some(entry) = self.positions.get(&handle).map(|position| &self.entries[*position])
        else {
            return;
        };

        if let Some(state) = states.get(&handle).copied() {
            if state == WalkState::OnStack {
                if entry.forwardable {
                    log::trace!("forward declaring definition #{}", handle.index());
                    items.push(SetItem::Forward(handle));
                }
                states.insert(handle, WalkState::ForwardYielded);
            }
            return;
        }

        states.insert(handle, WalkState::OnStack);
        for dependency in &entry.dependencies {
            self.visit(*dependency, states, items);
        }

        let forward_declared =
            entry.forwardable && states.get(&handle) == Some(&WalkState::ForwardYielded);
        states.insert(handle, WalkState::Yielded);
        items.push(SetItem::Definition {
            handle,
            forward_declared,
        });
    }
}
