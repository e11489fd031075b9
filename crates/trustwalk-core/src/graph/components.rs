//! Strongly connected components of a trust graph.
//!
//! Votes can only travel along trust edges, so a voter outside the
//! component that holds most queries contributes little. Drivers use
//! [`TrustGraph::largest_component`] to decide whether an item is worth
//! propagating at all.

use rustc_hash::FxHashMap;

use super::trust_graph::TrustGraph;

struct Frame {
    vertex: u64,
    targets: Vec<u64>,
    next: usize,
}

impl TrustGraph {
    /// Returns the strongly connected components (iterative Tarjan).
    ///
    /// Each component lists its vertex ids in ascending order. Components
    /// are returned in reverse topological order of the condensation.
    #[must_use]
    pub fn strongly_connected_components(&self) -> Vec<Vec<u64>> {
        let mut index_of: FxHashMap<u64, usize> = FxHashMap::default();
        let mut low_link: FxHashMap<u64, usize> = FxHashMap::default();
        let mut on_stack: FxHashMap<u64, bool> = FxHashMap::default();
        let mut stack: Vec<u64> = Vec::new();
        let mut components = Vec::new();
        let mut next_index = 0usize;

        for root in self.vertex_ids() {
            if index_of.contains_key(&root) {
                continue;
            }
            let mut call_stack = vec![self.open_frame(
                root,
                &mut next_index,
                &mut index_of,
                &mut low_link,
                &mut on_stack,
                &mut stack,
            )];

            while let Some(frame) = call_stack.last_mut() {
                if frame.next < frame.targets.len() {
                    let target = frame.targets[frame.next];
                    frame.next += 1;
                    let vertex = frame.vertex;
                    if !index_of.contains_key(&target) {
                        let child = self.open_frame(
                            target,
                            &mut next_index,
                            &mut index_of,
                            &mut low_link,
                            &mut on_stack,
                            &mut stack,
                        );
                        call_stack.push(child);
                    } else if on_stack.get(&target).copied().unwrap_or(false) {
                        let candidate = index_of[&target];
                        let low = low_link.entry(vertex).or_insert(candidate);
                        *low = (*low).min(candidate);
                    }
                    continue;
                }

                let vertex = frame.vertex;
                call_stack.pop();
                let vertex_low = low_link[&vertex];
                if let Some(parent) = call_stack.last() {
                    let parent_low = low_link.entry(parent.vertex).or_insert(vertex_low);
                    *parent_low = (*parent_low).min(vertex_low);
                }

                if vertex_low == index_of[&vertex] {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack.insert(member, false);
                        component.push(member);
                        if member == vertex {
                            break;
                        }
                    }
                    component.sort_unstable();
                    components.push(component);
                }
            }
        }
        components
    }

    /// Returns the largest strongly connected component, ties broken by
    /// the smallest member id. Empty for an empty graph.
    #[must_use]
    pub fn largest_component(&self) -> Vec<u64> {
        self.strongly_connected_components()
            .into_iter()
            .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| b[0].cmp(&a[0])))
            .unwrap_or_default()
    }

    fn open_frame(
        &self,
        vertex: u64,
        next_index: &mut usize,
        index_of: &mut FxHashMap<u64, usize>,
        low_link: &mut FxHashMap<u64, usize>,
        on_stack: &mut FxHashMap<u64, bool>,
        stack: &mut Vec<u64>,
    ) -> Frame {
        index_of.insert(vertex, *next_index);
        low_link.insert(vertex, *next_index);
        *next_index += 1;
        stack.push(vertex);
        on_stack.insert(vertex, true);
        Frame {
            vertex,
            targets: self.outgoing(vertex).map(|e| e.target()).collect(),
            next: 0,
        }
    }
}
