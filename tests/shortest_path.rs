use dynamic_network_algorithms::graph::{ArcId, DynamicGraph, Network, NodeId};
use dynamic_network_algorithms::minimum_cost_flow::{PricingStrategy, SolutionStatus};
use dynamic_network_algorithms::shortest_path::DynamicShortestPath;
use dynamic_network_algorithms::Error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use std::collections::BTreeMap;

fn add_edge(graph: &mut DynamicGraph<i64>, from: NodeId, to: NodeId, length: i64) -> ArcId {
    let arc = graph.add_arc(from, to).unwrap();
    graph.set_arc_attribute(arc, "length", length).unwrap();
    arc
}

// node 5 only has an arc into 4, so it cannot be reached from 0
fn road_map() -> (DynamicGraph<i64>, Vec<NodeId>, Vec<ArcId>) {
    let mut graph = DynamicGraph::new();
    let n = graph.add_nodes(6);
    let arcs = vec![
        add_edge(&mut graph, n[0], n[1], 4),
        add_edge(&mut graph, n[0], n[2], 1),
        add_edge(&mut graph, n[2], n[1], 2),
        add_edge(&mut graph, n[1], n[3], 1),
        add_edge(&mut graph, n[2], n[3], 5),
        add_edge(&mut graph, n[3], n[4], 3),
        add_edge(&mut graph, n[5], n[4], 1),
    ];
    (graph, n, arcs)
}

fn shortest_paths(graph: &mut DynamicGraph<i64>, source: NodeId, pricing: PricingStrategy) -> DynamicShortestPath<i64> {
    let mut sssp = DynamicShortestPath::new(source, "length").with_pricing(pricing);
    sssp.init(graph);
    sssp
}

fn distances(sssp: &DynamicShortestPath<i64>, nodes: &[NodeId]) -> Vec<Option<i64>> {
    nodes.iter().map(|&node| sssp.distance(node).unwrap()).collect()
}

fn bellman_ford(graph: &DynamicGraph<i64>, source: NodeId) -> BTreeMap<NodeId, i64> {
    let mut distance = BTreeMap::from([(source, 0)]);
    for _ in 0..graph.num_nodes() {
        for arc in graph.arcs() {
            let (from, to) = graph.endpoints(arc).unwrap();
            let length = graph.arc_attribute(arc, "length").and_then(|value| value.as_number()).unwrap();
            if let Some(&d) = distance.get(&from) {
                if distance.get(&to).map_or(true, |&current| d + length < current) {
                    distance.insert(to, d + length);
                }
            }
        }
    }
    distance
}

#[rstest]
fn distances_and_paths_from_the_source(#[values(PricingStrategy::FirstNegative, PricingStrategy::MostNegative)] pricing: PricingStrategy) {
    let (mut graph, n, arcs) = road_map();
    let mut sssp = shortest_paths(&mut graph, n[0], pricing);

    // node 5 keeps its unit from the artificial root
    assert_eq!(sssp.compute(&graph), Ok(SolutionStatus::Infeasible));
    assert_eq!(distances(&sssp, &n), vec![Some(0), Some(3), Some(1), Some(4), Some(7), None]);
    assert_eq!(sssp.path(n[4]), Ok(Some(vec![arcs[1], arcs[2], arcs[3], arcs[5]])));
    assert_eq!(sssp.path(n[0]), Ok(Some(vec![])));
    assert_eq!(sssp.path(n[5]), Ok(None));
    assert_eq!(sssp.predecessor_arc(n[1]), Ok(Some(arcs[2])));
    assert_eq!(sssp.predecessor_arc(n[0]), Ok(None));
    assert_eq!(sssp.is_reachable(n[5]), Ok(false));
    assert_eq!(sssp.is_reachable(n[3]), Ok(true));
    assert_eq!(sssp.source(), n[0]);
    assert!(sssp.network_simplex().satisfy_optimality_conditions());
}

#[rstest]
fn length_changes_reroute_the_tree(#[values(PricingStrategy::FirstNegative, PricingStrategy::MostNegative)] pricing: PricingStrategy) {
    let (mut graph, n, arcs) = road_map();
    let mut sssp = shortest_paths(&mut graph, n[0], pricing);
    sssp.compute(&graph).unwrap();

    graph.set_arc_attribute(arcs[1], "length", 10_i64).unwrap();
    sssp.compute(&graph).unwrap();
    assert_eq!(distances(&sssp, &n), vec![Some(0), Some(4), Some(10), Some(5), Some(8), None]);
    assert_eq!(sssp.predecessor_arc(n[1]), Ok(Some(arcs[0])));
    assert_eq!(sssp.predecessor_arc(n[2]), Ok(Some(arcs[1])));

    graph.set_arc_attribute(arcs[1], "length", 1_i64).unwrap();
    sssp.compute(&graph).unwrap();
    assert_eq!(distances(&sssp, &n), vec![Some(0), Some(3), Some(1), Some(4), Some(7), None]);
    assert_eq!(sssp.network_simplex().num_rebuilds(), 1);
}

#[rstest]
fn topology_changes(#[values(PricingStrategy::FirstNegative, PricingStrategy::MostNegative)] pricing: PricingStrategy) {
    let (mut graph, n, arcs) = road_map();
    let mut sssp = shortest_paths(&mut graph, n[0], pricing);
    sssp.compute(&graph).unwrap();

    let bridge = add_edge(&mut graph, n[4], n[5], 2);
    assert_eq!(sssp.compute(&graph), Ok(SolutionStatus::Optimal));
    assert_eq!(sssp.distance(n[5]), Ok(Some(9)));
    assert_eq!(sssp.predecessor_arc(n[5]), Ok(Some(bridge)));

    graph.remove_arc(arcs[3]).unwrap();
    sssp.compute(&graph).unwrap();
    assert_eq!(distances(&sssp, &n), vec![Some(0), Some(3), Some(1), Some(6), Some(9), Some(11)]);
    assert_eq!(sssp.path(n[4]), Ok(Some(vec![arcs[1], arcs[4], arcs[5]])));

    graph.remove_node(n[2]).unwrap();
    sssp.compute(&graph).unwrap();
    assert_eq!(sssp.distance(n[2]), Err(Error::UnknownNode(n[2])));
    assert_eq!(sssp.distance(n[1]), Ok(Some(4)));
    assert_eq!(sssp.distance(n[3]), Ok(None));

    let late = graph.add_node();
    assert_eq!(sssp.compute(&graph), Ok(SolutionStatus::Infeasible));
    assert_eq!(sssp.is_reachable(late), Ok(false));
    add_edge(&mut graph, n[1], late, 6);
    sssp.compute(&graph).unwrap();
    assert_eq!(sssp.distance(late), Ok(Some(10)));
    assert_eq!(sssp.network_simplex().num_rebuilds(), 1);
}

#[test]
fn removing_the_source_fails_every_query() {
    let (mut graph, n, _) = road_map();
    let mut sssp = shortest_paths(&mut graph, n[0], PricingStrategy::default());
    sssp.compute(&graph).unwrap();

    graph.remove_node(n[0]).unwrap();
    assert_eq!(sssp.compute(&graph), Err(Error::SourceNotFound(n[0])));
    assert_eq!(sssp.distance(n[3]), Err(Error::SourceNotFound(n[0])));
    assert_eq!(sssp.path(n[3]), Err(Error::SourceNotFound(n[0])));
    assert_eq!(sssp.is_reachable(n[3]), Err(Error::SourceNotFound(n[0])));
}

#[rstest]
fn agrees_with_bellman_ford_under_random_changes(
    #[values(PricingStrategy::FirstNegative, PricingStrategy::MostNegative)] pricing: PricingStrategy,
    #[values(3, 11, 99)] seed: u64,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = DynamicGraph::<i64>::new();
    let mut nodes = graph.add_nodes(10);
    let source = nodes[0];
    let mut arcs = Vec::new();
    for _ in 0..25 {
        let (u, v) = (nodes[rng.gen_range(0..nodes.len())], nodes[rng.gen_range(0..nodes.len())]);
        arcs.push(add_edge(&mut graph, u, v, rng.gen_range(0..10)));
    }

    let mut sssp = shortest_paths(&mut graph, source, pricing);
    for step in 0..60 {
        match rng.gen_range(0..5) {
            0 | 1 if !arcs.is_empty() => {
                let arc = arcs[rng.gen_range(0..arcs.len())];
                graph.set_arc_attribute(arc, "length", rng.gen_range(0..10_i64)).unwrap();
            }
            2 if !arcs.is_empty() => {
                let arc = arcs.swap_remove(rng.gen_range(0..arcs.len()));
                graph.remove_arc(arc).unwrap();
            }
            3 if nodes.len() > 4 => {
                let node = nodes.swap_remove(rng.gen_range(1..nodes.len()));
                graph.remove_node(node).unwrap();
                arcs.retain(|&arc| graph.contains_arc(arc));
            }
            4 => nodes.push(graph.add_node()),
            _ => {
                let (u, v) = (nodes[rng.gen_range(0..nodes.len())], nodes[rng.gen_range(0..nodes.len())]);
                arcs.push(add_edge(&mut graph, u, v, rng.gen_range(0..10)));
            }
        }
        if step % 2 == 1 {
            continue;
        }

        sssp.compute(&graph).unwrap();
        let expected = bellman_ford(&graph, source);
        for &node in &nodes {
            assert_eq!(sssp.distance(node).unwrap(), expected.get(&node).copied(), "step {step}, node {node}");
            if let Some(path) = sssp.path(node).unwrap() {
                let length: i64 = path.iter().map(|&arc| graph.arc_attribute(arc, "length").and_then(|value| value.as_number()).unwrap()).sum();
                assert_eq!(Some(length), expected.get(&node).copied());
            }
        }
    }
    assert_eq!(sssp.network_simplex().num_rebuilds(), 1);
}
