use dynamic_network_algorithms::graph::{DynamicGraph, NodeId};
use dynamic_network_algorithms::minimum_cost_flow::{AttributeNames, NetworkSimplex, PricingStrategy, SolutionStatus};
use dynamic_network_algorithms::shortest_path::DynamicShortestPath;

fn main() -> dynamic_network_algorithms::Result<()> {
    let mut graph = DynamicGraph::<i64>::new();
    let nodes = graph.add_nodes(6);
    let names = ["A", "B", "C", "D", "E", "F"];
    for (&node, supply) in nodes.iter().zip([5_i64, 2, 0, -1, -4, -2]) {
        graph.set_node_attribute(node, "supply", supply)?;
    }

    let mut arcs = Vec::new();
    for (from, to, cost, capacity) in [(0, 1, 1_i64, 3_i64), (0, 2, 5, 5), (1, 2, 1, 6), (2, 3, 8, 1), (2, 4, 5, 4), (2, 5, 2, 6), (5, 4, 2, 3)] {
        let arc = graph.add_arc(nodes[from], nodes[to])?;
        graph.set_arc_attribute(arc, "cost", cost)?;
        graph.set_arc_attribute(arc, "capacity", capacity)?;
        arcs.push((arc, names[from], names[to]));
    }

    let mut simplex = NetworkSimplex::new(AttributeNames::default()).with_pricing(PricingStrategy::MostNegative);
    simplex.init(&mut graph);
    let status = simplex.compute(&graph)?;
    println!("status:{status:?} minimum cost:{} pivots:{}", simplex.objective_value(), simplex.num_pivots());
    for &(arc, from, to) in &arcs {
        println!("{from}->{to} flow:{} {:?}", simplex.flow(arc)?, simplex.arc_status(arc)?);
    }

    // close C->D: D can no longer be served
    graph.set_arc_attribute(arcs[3].0, "capacity", 0_i64)?;
    if simplex.compute(&graph)? == SolutionStatus::Infeasible {
        for (&node, name) in nodes.iter().zip(names) {
            println!("{name} balance:{}", simplex.node_balance(node)?);
        }
    }

    graph.set_arc_attribute(arcs[3].0, "capacity", 1_i64)?;
    graph.set_arc_attribute(arcs[0].0, "cost", 5_i64)?;
    let status = simplex.compute(&graph)?;
    println!("status:{status:?} minimum cost:{} pivots:{}", simplex.objective_value(), simplex.num_pivots());

    let mut sssp = DynamicShortestPath::new(nodes[0], "cost");
    sssp.init(&mut graph);
    sssp.compute(&graph)?;
    for (&node, name) in nodes.iter().zip(names) {
        print_distance(&sssp, node, name)?;
    }
    Ok(())
}

fn print_distance(sssp: &DynamicShortestPath<i64>, node: NodeId, name: &str) -> dynamic_network_algorithms::Result<()> {
    match sssp.distance(node)? {
        Some(distance) => println!("A->{name} distance:{distance} path:{:?}", sssp.path(node)?.unwrap_or_default()),
        None => println!("A->{name} unreachable"),
    }
    Ok(())
}
