use proptest::prelude::*;

use crate::geometry::{MAX_X, MAX_Y, MIN_X, MIN_Y, Point};
use crate::graph::{Edge, GraphError, MAX_EDGES, MIN_EDGES, Nodes, reference_layout, topology};
use crate::multiplayer::wire::{DecodeError, decode_edges, decode_nodes, encode_edges, encode_nodes};

fn nodes_strategy() -> impl Strategy<Value = Nodes> {
    prop::array::uniform6((MIN_X..=MAX_X, MIN_Y..=MAX_Y))
        .prop_map(|points| Nodes(points.map(Point::from)))
}

#[test]
fn node_payload_format() {
    let nodes = Nodes([
        Point::new(5, 41),
        Point::new(120, 60),
        Point::new(234, 234),
        Point::new(17, 200),
        Point::new(99, 99),
        Point::new(42, 150),
    ]);
    assert_eq!(
        encode_nodes(&nodes),
        "5,41;120,60;234,234;17,200;99,99;42,150;e"
    );
}

#[test]
fn edge_payload_format() {
    assert_eq!(
        encode_edges(&topology(9)),
        "0,1;1,2;0,4;4,3;1,5;2,5;4,5;3,5;0,2;"
    );
    assert_eq!(encode_edges(&[]), "");
}

#[test]
fn edge_payload_tolerates_terminator() {
    let payload = encode_edges(&topology(10));
    let plain = decode_edges(&payload).unwrap();
    let terminated = decode_edges(&format!("{payload}e")).unwrap();
    assert_eq!(plain, terminated);
    assert_eq!(plain[1], Edge::from_indices(1, 2).unwrap());
}

#[test]
fn node_payload_needs_terminator() {
    let payload = encode_nodes(&reference_layout());
    let cut = payload.trim_end_matches('e');
    assert_eq!(decode_nodes(cut), Err(DecodeError::MissingSentinel));
}

#[test]
fn five_nodes_are_rejected() {
    assert_eq!(
        decode_nodes("5,41;6,42;7,43;8,44;9,45;e"),
        Err(DecodeError::WrongNodeCount {
            expected: 6,
            found: 5
        })
    );
}

#[test]
fn nodes_outside_playfield_are_rejected() {
    assert_eq!(
        decode_nodes("5,41;6,42;7,43;8,44;9,45;10,20;e"),
        Err(DecodeError::OutOfBounds {
            index: 5,
            point: Point::new(10, 20)
        })
    );
    assert!(matches!(
        decode_nodes("235,41;6,42;7,43;8,44;9,45;10,46;e"),
        Err(DecodeError::OutOfBounds { index: 0, .. })
    ));
}

#[test]
fn data_after_terminator_is_rejected() {
    assert!(matches!(
        decode_nodes("5,41;6,42;7,43;8,44;9,45;10,46;e7"),
        Err(DecodeError::TrailingData { .. })
    ));
}

#[test]
fn payload_without_digits_is_empty() {
    assert_eq!(decode_nodes("e"), Err(DecodeError::Empty));
    assert_eq!(decode_edges(""), Err(DecodeError::Empty));
}

#[test]
fn bad_edges_are_rejected() {
    let nine = encode_edges(&topology(9));
    assert_eq!(
        decode_edges(&format!("{nine}0,6;")),
        Err(DecodeError::Graph(GraphError::NodeOutOfRange(6)))
    );
    assert!(matches!(
        decode_edges(&format!("{nine}3,3;")),
        Err(DecodeError::Graph(GraphError::SelfLoop(_)))
    ));

    let thirteen = "0,1;".repeat(MAX_EDGES + 1);
    assert_eq!(
        decode_edges(&thirteen),
        Err(DecodeError::Graph(GraphError::TooManyEdges(13)))
    );
}

#[test]
fn short_edge_payloads_are_rejected() {
    assert_eq!(
        decode_edges("0,1;1,2;"),
        Err(DecodeError::TooFewEdges { min: 10, found: 2 })
    );
    // A ten-edge payload cut short by one tuple.
    let cut = encode_edges(&topology(10));
    let cut = cut.strip_suffix("0,3;").unwrap();
    assert_eq!(
        decode_edges(cut),
        Err(DecodeError::TooFewEdges {
            min: MIN_EDGES,
            found: 9
        })
    );
}

proptest! {
    #[test]
    fn prop_nodes_survive_the_wire(nodes in nodes_strategy()) {
        prop_assert_eq!(decode_nodes(&encode_nodes(&nodes)).unwrap(), nodes);
    }

    #[test]
    fn prop_edges_survive_the_wire(count in MIN_EDGES..=MAX_EDGES) {
        let edges = topology(count);
        prop_assert_eq!(decode_edges(&encode_edges(&edges)).unwrap(), edges);
    }
}
