use proptest::prelude::*;
use subtheme::cluster::{
    ClusterRanker, GlobalProjector, Louvain, NeighborGraphBuilder, Partition, Partitioner,
};

fn corpus(d: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-10.0f32..10.0, d), 4..30)
}

proptest! {
    #[test]
    fn prop_projections_are_unit_or_zero(data in corpus(6), k in 1usize..4) {
        let fitted = GlobalProjector::new(k).with_seed(42).fit(&data).unwrap();
        for row in fitted.project(&data).unwrap() {
            prop_assert_eq!(row.len(), k);
            let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            prop_assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-4, "norm {}", norm);
        }
        let zero = fitted.project_one(&[0.0; 6]).unwrap();
        prop_assert!(zero.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn prop_graph_is_symmetric_and_bounded(
        data in corpus(4),
        k in 1usize..8,
        use_snn in any::<bool>(),
        threshold in 0.0f32..1.0
    ) {
        let graph = NeighborGraphBuilder::new(k)
            .with_snn(use_snn)
            .with_snn_threshold(threshold)
            .build(&data);

        prop_assert_eq!(graph.n_nodes(), data.len());
        for e in graph.edges() {
            prop_assert!(e.source < e.target);
            prop_assert_eq!(graph.weight(e.source, e.target), Some(e.weight));
            prop_assert_eq!(graph.weight(e.target, e.source), Some(e.weight));
            prop_assert!(e.weight <= 1.0);
            if use_snn {
                prop_assert!(e.weight >= threshold);
            } else {
                prop_assert!(e.weight >= 0.0);
            }
        }
    }

    #[test]
    fn prop_partition_covers_every_node_once(
        data in corpus(4),
        k in 1usize..6,
        resolution in 0.05f64..4.0,
        seed in any::<u64>()
    ) {
        let graph = NeighborGraphBuilder::new(k).with_snn(false).build(&data);
        let partition = Louvain::new().partition(&graph, resolution, seed).unwrap();

        let mut seen: Vec<usize> = partition.groups().iter().flatten().copied().collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..data.len()).collect::<Vec<_>>());
        prop_assert!(partition.groups().iter().all(|g| !g.is_empty()));
    }

    #[test]
    fn prop_ranked_clusters_respect_bounds(
        labels in prop::collection::vec(0usize..6, 1..40),
        min_size in 1usize..5,
        max_clusters in 0usize..4
    ) {
        let vectors: Vec<Vec<f32>> = labels
            .iter()
            .enumerate()
            .map(|(i, &l)| vec![l as f32 + 1.0, (i % 3) as f32])
            .collect();
        let partition = Partition::from_labels(&labels);
        let clusters = ClusterRanker::new(min_size, max_clusters).rank(&partition, &vectors, &[1.0, 0.0]);

        prop_assert!(clusters.len() <= max_clusters);
        for c in &clusters {
            prop_assert!(c.size >= min_size);
            prop_assert_eq!(c.size, c.indices.len());
            prop_assert!(c.representative_items.len() <= 3);
        }
        for w in clusters.windows(2) {
            prop_assert!(w[0].size >= w[1].size);
        }
    }
}
