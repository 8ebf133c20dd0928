use topobuf::{AreaId, IdMap, NodeId, UndirectedGraph};

#[test]
fn two_pairs_form_two_components() {
    let mut graph = UndirectedGraph::<AreaId>::new(4);
    graph.insert_edge(AreaId(0), AreaId(1)).unwrap();
    graph.insert_edge(AreaId(2), AreaId(3)).unwrap();

    let components = graph.connected_components();

    assert_eq!(components.len(), 2);
    assert_eq!(components.sizes(), &[2, 2]);
    assert_eq!(components.component(AreaId(0)), components.component(AreaId(1)));
    assert_ne!(components.component(AreaId(1)), components.component(AreaId(2)));
    assert_eq!(components.groups(), vec![
        vec![AreaId(0), AreaId(1)],
        vec![AreaId(2), AreaId(3)],
    ]);
}

#[test]
fn isolated_vertices_are_singleton_components() {
    let mut graph = UndirectedGraph::<AreaId>::new(5);
    graph.insert_edge(AreaId(1), AreaId(3)).unwrap();

    let components = graph.connected_components();

    assert_eq!(components.len(), 4);
    assert_eq!(components.sizes().iter().sum::<usize>(), 5);
    assert_eq!(components.labels(), &[0, 1, 2, 1, 3]);
}

#[test]
fn long_cycle_is_one_component() {
    let n = 10_000u32;
    let mut graph = UndirectedGraph::<NodeId>::new(n as usize);
    for i in 0..n {
        graph.insert_edge(NodeId(i), NodeId((i + 1) % n)).unwrap();
    }

    let components = graph.connected_components();

    assert_eq!(components.len(), 1);
    assert_eq!(components.sizes(), &[n as usize]);
    assert!(graph.vertices().all(|v| graph.degree(v) == 2));
}

#[test]
fn remap_renumbers_surviving_edges() {
    let mut graph = UndirectedGraph::<AreaId>::new(5);
    graph.insert_edge(AreaId(0), AreaId(4)).unwrap();
    graph.insert_edge(AreaId(1), AreaId(2)).unwrap();
    graph.insert_edge(AreaId(3), AreaId(4)).unwrap();

    let map = IdMap::from_keep_mask(&[false, true, true, true, true]);
    let graph = graph.remap(&map).unwrap();

    assert_eq!(graph.vertex_count(), 4);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.contains_edge(AreaId(0), AreaId(1)));
    assert!(graph.contains_edge(AreaId(3), AreaId(2)));
    assert_eq!(graph.degree(AreaId(3)), 1);
}

#[test]
fn remap_rejects_map_of_other_size() {
    let graph = UndirectedGraph::<AreaId>::new(3);
    assert!(graph.remap(&IdMap::identity(2)).is_err());
}
