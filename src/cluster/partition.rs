use std::collections::BTreeMap;

/// A disjoint, exhaustive grouping of node indices.
///
/// Groups are kept in canonical order: largest first, equal sizes by their
/// smallest member. Members within a group are ascending. A group's position is
/// its community id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    groups: Vec<Vec<usize>>,
    n_nodes: usize,
}

impl Partition {
    /// Build from a per-node label vector (`labels[node] = community`).
    ///
    /// Label values are arbitrary; only equality matters.
    pub fn from_labels(labels: &[usize]) -> Self {
        let mut by_label: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (node, &label) in labels.iter().enumerate() {
            by_label.entry(label).or_default().push(node);
        }

        let mut groups: Vec<Vec<usize>> = by_label.into_values().collect();
        groups.sort_by(|a, b| b.len().cmp(&a.len()).then(a[0].cmp(&b[0])));
        Self {
            groups,
            n_nodes: labels.len(),
        }
    }

    /// Every node in its own group.
    pub fn singletons(n_nodes: usize) -> Self {
        Self {
            groups: (0..n_nodes).map(|i| vec![i]).collect(),
            n_nodes,
        }
    }

    /// Groups in canonical order.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Consume into the group list.
    pub fn into_groups(self) -> Vec<Vec<usize>> {
        self.groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of nodes covered.
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Per-node community ids (`labels()[node] = group position`).
    pub fn labels(&self) -> Vec<usize> {
        let mut labels = vec![0; self.n_nodes];
        for (id, group) in self.groups.iter().enumerate() {
            for &node in group {
                labels[node] = id;
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_is_size_then_first_member() {
        let p = Partition::from_labels(&[7, 3, 7, 9, 3, 3, 1]);
        assert_eq!(
            p.groups(),
            &[vec![1, 4, 5], vec![0, 2], vec![3], vec![6]]
        );
        assert_eq!(p.labels(), vec![1, 0, 1, 2, 0, 0, 3]);
        assert_eq!(p.n_nodes(), 7);
    }

    #[test]
    fn singletons_cover_every_node() {
        let p = Partition::singletons(3);
        assert_eq!(p.len(), 3);
        assert_eq!(p, Partition::from_labels(&[0, 1, 2]));
        assert!(Partition::singletons(0).is_empty());
    }
}
