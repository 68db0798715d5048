//! Runs every engine over Zachary's karate club and prints what a reporting layer would consume.
//!
//! `RUST_LOG=strata=debug cargo run --example karate` shows the per block count fits.

use std::{error::Error, fs};

use serde::Deserialize;
use strata::{
    centrality,
    edge::Edge,
    graph::Graph,
    sbm::{SbmConfig, SbmEstimator},
    transitivity,
};
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct Sample {
    nodes: usize,
    edges: Vec<(usize, usize)>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sample: Sample = serde_json::from_str(&fs::read_to_string("testdata/karate.json")?)?;
    let graph = Graph::new(sample.nodes, sample.edges.into_iter().map(Edge::from))?;

    println!(
        "{} nodes, {} edges, density {:.3}",
        graph.node_count(),
        graph.edge_count(),
        graph.density()
    );

    let degree = centrality::degree(&graph);
    let betweenness = centrality::betweenness(&graph);
    let closeness = centrality::closeness(&graph);
    let clustering = transitivity::local_clustering(&graph);

    println!("\n node  degree  betweenness  closeness  clustering");
    for node in betweenness.top(10) {
        println!(
            "{node:>5}  {:>6}  {:>11.3}  {:>9.3}  {:>10.3}",
            degree.value(node),
            betweenness.value(node),
            closeness.value(node),
            clustering.value(node),
        );
    }

    println!(
        "\ntransitivity {:.4}, average clustering {:.4}, {} triangles",
        transitivity::global_clustering(&graph),
        transitivity::average_clustering(&graph),
        transitivity::triangle_count(&graph)
    );

    for notice in clustering.notices() {
        println!("note: {notice}");
    }

    let config = SbmConfig {
        random_seed: Some(34),
        ..Default::default()
    };
    let report = SbmEstimator::new(config)?.estimate(&graph)?;

    println!("\n  K  lower bound         ICL");
    for fit in report.fits() {
        let marker = if fit.blocks() == report.blocks() { "*" } else { " " };
        println!(
            "{marker}{:>2}  {:>11.3}  {:>10.3}",
            fit.blocks(),
            fit.lower_bound(),
            fit.icl()
        );
    }

    let selected = report.selected();
    println!("\nconnectivity\n{}", selected.connectivity());
    for block in 0..selected.blocks() {
        println!("block {block}: {:?}", selected.block_members(block));
    }

    println!("\n{}", serde_json::to_string(&selected.proportions())?);

    Ok(())
}
