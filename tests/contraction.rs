//! End-to-end preparation and query scenarios.

use butterfly_ch::dijkstra::shortest_path_weight;
use butterfly_ch::prepare::ChPreparation;
use butterfly_ch::query::ChQuery;
use butterfly_ch::validate::random_graph;
use butterfly_ch::{EdgeFlags, LevelGraph};
use petgraph::graph::NodeIndex;

fn node(i: usize) -> NodeIndex {
    NodeIndex::new(i)
}

#[test]
fn triangle_keeps_the_cheap_detour() {
    // A -> B -> C beats the direct A -> C
    let mut g = LevelGraph::with_nodes(3);
    let e_ab = g.add_edge(node(0), node(1), 1.0, EdgeFlags::FORWARD);
    let e_bc = g.add_edge(node(1), node(2), 1.0, EdgeFlags::FORWARD);
    g.add_edge(node(0), node(2), 3.0, EdgeFlags::FORWARD);

    let mut prep = ChPreparation::new(&mut g);
    prep.do_work().expect("prepare");

    let route = prep
        .create_algo()
        .query(node(0), node(2))
        .expect("route exists");
    assert_eq!(route.weight, 2.0);
    assert_eq!(route.edges, vec![e_ab, e_bc]);
    assert_eq!(route.nodes, vec![node(0), node(1), node(2)]);
}

#[test]
fn ring_contraction_materializes_one_bidirectional_shortcut() {
    // five-node ring of bidirectional unit edges; contracting the first
    // node must bridge its two neighbors
    let mut g = LevelGraph::with_nodes(5);
    let e_01 = g.add_edge(node(0), node(1), 1.0, EdgeFlags::BOTH);
    g.add_edge(node(1), node(2), 1.0, EdgeFlags::BOTH);
    g.add_edge(node(2), node(3), 1.0, EdgeFlags::BOTH);
    g.add_edge(node(3), node(4), 1.0, EdgeFlags::BOTH);
    let e_40 = g.add_edge(node(4), node(0), 1.0, EdgeFlags::BOTH);

    let mut prep = ChPreparation::new(&mut g);
    let stats = prep.do_work().expect("prepare");
    assert_eq!(stats.nodes_contracted, 5);
    assert_eq!(stats.shortcuts_added, 1);

    let prepared = prep.graph();
    let shortcut = prepared
        .all_edges()
        .find(|&e| prepared.edge(e).is_shortcut())
        .expect("one shortcut");
    assert_eq!(prepared.edge(shortcut).weight, 2.0);
    assert_eq!(prepared.edge(shortcut).flags, EdgeFlags::BOTH);
    // original-edge count of a shortcut is the sum of its halves
    assert_eq!(prep.orig_edge_count(shortcut), 2);

    // the shortcut answers the query its ring segment would have needed,
    // and unpacks to the two original edges around the contracted node
    let route = prep
        .create_algo()
        .query(node(1), node(4))
        .expect("route exists");
    assert_eq!(route.weight, 2.0);
    assert_eq!(route.edges, vec![e_01, e_40]);
    assert_eq!(route.nodes, vec![node(1), node(0), node(4)]);
}

#[test]
fn chain_gets_strictly_increasing_levels() {
    let mut g = LevelGraph::with_nodes(4);
    let e_ab = g.add_edge(node(0), node(1), 1.0, EdgeFlags::FORWARD);
    let e_bc = g.add_edge(node(1), node(2), 1.0, EdgeFlags::FORWARD);
    let e_cd = g.add_edge(node(2), node(3), 1.0, EdgeFlags::FORWARD);

    let mut prep = ChPreparation::new(&mut g);
    let stats = prep.do_work().expect("prepare");
    assert_eq!(stats.nodes_contracted, 4);
    assert_eq!(stats.shortcuts_added, 0);

    let route = prep
        .create_algo()
        .query(node(0), node(3))
        .expect("route exists");
    assert_eq!(route.weight, 3.0);
    assert_eq!(route.edges, vec![e_ab, e_bc, e_cd]);
}

#[test]
fn levels_are_distinct_and_dense() {
    let mut g = random_graph(40, 100, 99);
    let mut prep = ChPreparation::new(&mut g);
    prep.do_work().expect("prepare");

    let mut levels: Vec<i32> = (0..40).map(|i| prep.graph().get_level(node(i))).collect();
    levels.sort_unstable();
    let expected: Vec<i32> = (1..=40).collect();
    assert_eq!(levels, expected);
}

#[test]
fn empty_graph_prepares_and_answers_no_path() {
    let mut g = LevelGraph::new();
    let mut prep = ChPreparation::new(&mut g);
    let stats = prep.do_work().expect("empty graph is fine");
    assert_eq!(stats.nodes_contracted, 0);
    assert!(prep.create_algo().query(node(0), node(0)).is_none());
}

#[test]
fn disconnected_components_have_no_route() {
    let mut g = LevelGraph::with_nodes(4);
    g.add_edge(node(0), node(1), 1.0, EdgeFlags::BOTH);
    g.add_edge(node(2), node(3), 1.0, EdgeFlags::BOTH);

    let mut prep = ChPreparation::new(&mut g);
    prep.do_work().expect("prepare");

    let query = prep.create_algo();
    assert!(query.query(node(0), node(3)).is_none());
    assert!(query.query(node(0), node(1)).is_some());
}

#[test]
fn preparation_is_deterministic() {
    let run = |seed: u64| -> (Vec<i32>, Vec<(NodeIndex, NodeIndex, f64, EdgeFlags)>) {
        let mut g = random_graph(30, 80, seed);
        let mut prep = ChPreparation::new(&mut g);
        prep.do_work().expect("prepare");
        let g = prep.graph();
        let levels = (0..30).map(|i| g.get_level(node(i))).collect();
        let edges = g
            .all_edges()
            .map(|e| {
                let (from, to) = g.edge_endpoints(e);
                (from, to, g.edge(e).weight, g.edge(e).flags)
            })
            .collect();
        (levels, edges)
    };

    assert_eq!(run(5), run(5));
}

#[test]
fn queries_match_dijkstra_on_random_graphs() {
    for seed in [11, 12] {
        let original = random_graph(20, 50, seed);
        let mut prepared = original.clone();
        let mut prep = ChPreparation::new(&mut prepared);
        prep.do_work().expect("prepare");
        let query = prep.create_algo();

        for s in 0..20 {
            for t in 0..20 {
                let expected = shortest_path_weight(&original, node(s), node(t));
                let found = query.query(node(s), node(t));
                assert_eq!(
                    found.as_ref().map(|route| route.weight),
                    expected,
                    "seed {}: query {} → {} disagrees with Dijkstra",
                    seed,
                    s,
                    t
                );
                if let Some(route) = found {
                    assert_route_is_sound(prep.graph(), &route, node(s), node(t), seed);
                }
            }
        }
    }
}

/// The unpacked edge sequence must consist of original edges only, chain
/// from source to target through exactly `route.nodes`, and sum back to
/// the reported weight. Integral weights make the sum comparison exact.
fn assert_route_is_sound(
    g: &LevelGraph,
    route: &butterfly_ch::Route,
    source: NodeIndex,
    target: NodeIndex,
    seed: u64,
) {
    let summed: f64 = route.edges.iter().map(|&e| g.edge(e).weight).sum();
    assert_eq!(
        summed,
        route.weight,
        "seed {}: unpacked edges of {} → {} sum to {} instead of {}",
        seed,
        source.index(),
        target.index(),
        summed,
        route.weight
    );

    let mut walked = vec![source];
    let mut at = source;
    for &edge in &route.edges {
        assert!(
            !g.edge(edge).is_shortcut(),
            "seed {}: route {} → {} contains an unexpanded shortcut",
            seed,
            source.index(),
            target.index()
        );
        at = g.other_endpoint(edge, at);
        walked.push(at);
    }
    assert_eq!(walked, route.nodes);
    assert_eq!(at, target);
}

#[test]
fn prepared_graph_survives_a_save_load_round_trip() {
    let mut g = LevelGraph::with_nodes(3);
    g.add_edge(node(0), node(1), 1.0, EdgeFlags::FORWARD);
    g.add_edge(node(1), node(2), 1.0, EdgeFlags::FORWARD);
    g.add_edge(node(0), node(2), 3.0, EdgeFlags::FORWARD);

    {
        let mut prep = ChPreparation::new(&mut g);
        prep.do_work().expect("prepare");
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prepared.bin");
    g.save(&path).expect("save");

    let loaded = LevelGraph::load(&path).expect("load");
    assert_eq!(loaded.num_nodes(), g.num_nodes());
    assert_eq!(loaded.num_edges(), g.num_edges());

    let route = ChQuery::new(&loaded)
        .query(node(0), node(2))
        .expect("route exists");
    assert_eq!(route.weight, 2.0);
}
