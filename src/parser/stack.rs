//! Graph-structured stack.
//!
//! Each stack version is a head [`StackNode`]; nodes link down to their
//! predecessors through the subtree that was pushed. Versions share their
//! common prefix, and merging two heads in the same state at the same
//! position gives one node with several links, which is how local
//! ambiguities are packed.

use std::sync::Arc;

use crate::base::Length;
use crate::language::StateId;
use crate::tree::subtree::Subtree;

/// Upper bound on paths returned by one pop
pub(crate) const MAX_POP_PATHS: usize = 32;

pub(crate) type Head = Arc<StackNode>;

#[derive(Debug)]
pub(crate) struct StackNode {
    pub state: StateId,
    /// End of everything pushed so far
    pub position: Length,
    pub error_cost: u32,
    /// Scanner state after the last external token on this path
    pub external_state: Option<Arc<[u8]>>,
    pub links: Vec<StackLink>,
}

// Unlinks predecessor chains iteratively; a long stack would otherwise
// recurse once per entry when the last head goes away.
impl Drop for StackNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.links);
        while let Some(link) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(link.prev) {
                pending.append(&mut node.links);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StackLink {
    pub subtree: Subtree,
    pub prev: Head,
}

/// Subtrees removed by a pop, in source order, and the node below them
#[derive(Debug)]
pub(crate) struct StackSlice {
    pub subtrees: Vec<Subtree>,
    pub base: Head,
}

impl StackNode {
    pub fn base(state: StateId) -> Head {
        Arc::new(StackNode {
            state,
            position: Length::zero(),
            error_cost: 0,
            external_state: None,
            links: Vec::new(),
        })
    }

    pub fn push(prev: &Head, subtree: Subtree, state: StateId) -> Head {
        let external_state = match subtree.last_external_token() {
            Some(token) => token.external_state().cloned(),
            None => prev.external_state.clone(),
        };
        Arc::new(StackNode {
            state,
            position: prev.position + subtree.total_size(),
            error_cost: prev.error_cost.saturating_add(subtree.error_cost()),
            external_state,
            links: vec![StackLink {
                subtree,
                prev: prev.clone(),
            }],
        })
    }

    /// Join two heads in the same state at the same position.
    pub fn merge(a: &Head, b: &Head) -> Head {
        let mut links = a.links.clone();
        for link in &b.links {
            let duplicate = links
                .iter()
                .any(|l| l.subtree.ptr_eq(&link.subtree) && Arc::ptr_eq(&l.prev, &link.prev));
            if !duplicate {
                links.push(link.clone());
            }
        }
        Arc::new(StackNode {
            state: a.state,
            position: a.position,
            error_cost: a.error_cost.min(b.error_cost),
            external_state: a.external_state.clone(),
            links,
        })
    }

    pub fn same_external_state(&self, other: &StackNode) -> bool {
        self.external_state.as_deref() == other.external_state.as_deref()
    }
}

/// Pop `count` non-extra entries along every path (at most
/// [`MAX_POP_PATHS`]). Extras between popped entries are included; extras
/// below the last one are not.
pub(crate) fn pop_count(head: &Head, count: usize) -> Vec<StackSlice> {
    pop(head, Some(count))
}

/// Pop every entry down to the bottom of the stack along every path.
pub(crate) fn pop_all(head: &Head) -> Vec<StackSlice> {
    pop(head, None)
}

fn pop(head: &Head, count: Option<usize>) -> Vec<StackSlice> {
    struct Path {
        node: Head,
        subtrees: Vec<Subtree>,
        remaining: usize,
    }

    let mut slices = Vec::new();
    let mut pending = vec![Path {
        node: head.clone(),
        subtrees: Vec::new(),
        remaining: count.unwrap_or(usize::MAX),
    }];

    while let Some(Path {
        node,
        mut subtrees,
        remaining,
    }) = pending.pop()
    {
        let done = match count {
            Some(_) => remaining == 0,
            None => node.links.is_empty(),
        };
        if done {
            subtrees.reverse();
            slices.push(StackSlice { subtrees, base: node });
            if slices.len() >= MAX_POP_PATHS {
                break;
            }
            continue;
        }
        let Some((first, rest)) = node.links.split_first() else {
            // Ran out of stack before `count` entries.
            continue;
        };
        let step = |link: &StackLink| {
            if link.subtree.is_extra() { remaining } else { remaining - 1 }
        };
        // Reverse order so the first link is explored first.
        for link in rest.iter().rev() {
            let mut branch = subtrees.clone();
            branch.push(link.subtree.clone());
            pending.push(Path {
                node: link.prev.clone(),
                subtrees: branch,
                remaining: step(link),
            });
        }
        subtrees.push(first.subtree.clone());
        pending.push(Path {
            node: first.prev.clone(),
            subtrees,
            remaining: step(first),
        });
    }
    slices
}

/// The path from a head to the bottom following each node's first link.
pub(crate) struct FirstPath {
    /// Nodes from the head down
    nodes: Vec<Head>,
    /// `subtrees[i]` links `nodes[i]` to `nodes[i + 1]`
    subtrees: Vec<Subtree>,
    /// States that count for reductions, bottom first
    states: Vec<StateId>,
    /// Per node, how many of `states` are at or below it
    heights: Vec<usize>,
}

impl FirstPath {
    pub fn new(head: &Head) -> Self {
        let mut nodes = vec![head.clone()];
        let mut subtrees = Vec::new();
        let mut node = head.clone();
        while let Some(link) = node.links.first() {
            subtrees.push(link.subtree.clone());
            let prev = link.prev.clone();
            nodes.push(prev.clone());
            node = prev;
        }

        let mut states = Vec::with_capacity(nodes.len());
        let mut heights = vec![0; nodes.len()];
        for index in (0..nodes.len()).rev() {
            // A node reached by pushing an extra repeats the state below it.
            let counts = subtrees.get(index).is_none_or(|subtree| !subtree.is_extra());
            if counts {
                states.push(nodes[index].state);
            }
            heights[index] = states.len();
        }
        Self {
            nodes,
            subtrees,
            states,
            heights,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, depth: usize) -> &Head {
        &self.nodes[depth]
    }

    /// Reduction-relevant states at `depth`, bottom first.
    pub fn states(&self, depth: usize) -> &[StateId] {
        &self.states[..self.heights[depth]]
    }

    /// Subtrees between `depth` and the head, in source order.
    pub fn popped(&self, depth: usize) -> Vec<Subtree> {
        self.subtrees[..depth].iter().rev().cloned().collect()
    }

    /// Non-extra subtrees between `depth` and the head.
    pub fn popped_count(&self, depth: usize) -> usize {
        self.subtrees[..depth].iter().filter(|s| !s.is_extra()).count()
    }
}
