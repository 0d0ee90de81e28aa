use nalgebra::DMatrix;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Builds the simultaneous (lag-0) graph: an edge `from -> to` for every
/// non-zero `a0[(to, from)]`. Node `i` is variable `i`.
pub fn simultaneous_graph(a0: &DMatrix<f64>) -> DiGraph<usize, f64> {
    let n = a0.nrows();
    let mut graph = DiGraph::with_capacity(n, n);
    for i in 0..n {
        graph.add_node(i);
    }
    for to in 0..n {
        for from in 0..n {
            let coef = a0[(to, from)];
            if coef != 0.0 {
                graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), coef);
            }
        }
    }
    graph
}

/// Strongly connected lag-0 blocks that contain a cycle, each sorted by
/// variable index, blocks ordered by their first variable.
pub fn cyclic_blocks(a0: &DMatrix<f64>) -> Vec<Vec<usize>> {
    let graph = simultaneous_graph(a0);
    let mut blocks: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut block: Vec<usize> = scc.into_iter().map(|n| n.index()).collect();
            block.sort_unstable();
            block
        })
        .collect();
    blocks.sort_unstable_by_key(|b| b[0]);
    blocks
}

/// Performs a Topological Sort of the lag-0 structure using Depth-First Search (DFS).
///
/// Returns variable indices where every contemporaneous cause appears before
/// its effect, i.e. an order for sequential substitution in a recursive model.
/// Fails with the index of a variable on a cycle.
pub fn sort(a0: &DMatrix<f64>) -> Result<Vec<usize>, usize> {
    let count = a0.nrows();
    let mut order = Vec::with_capacity(count);
    let mut state = vec![VisitState::None; count];

    // Iterate 0..count so disconnected variables are visited too.
    for i in 0..count {
        if state[i] == VisitState::None {
            visit(i, a0, &mut state, &mut order)?;
        }
    }

    Ok(order)
}

#[derive(Clone, PartialEq, Eq)]
enum VisitState {
    None,
    Visiting, // Used for cycle detection
    Visited,
}

fn visit(
    node: usize,
    a0: &DMatrix<f64>,
    state: &mut Vec<VisitState>,
    order: &mut Vec<usize>,
) -> Result<(), usize> {
    match state[node] {
        VisitState::Visited => return Ok(()),
        VisitState::Visiting => return Err(node),
        VisitState::None => state[node] = VisitState::Visiting,
    }

    // Recurse on causes: the non-zero entries of this variable's row.
    for cause in 0..a0.ncols() {
        if a0[(node, cause)] != 0.0 {
            visit(cause, a0, state, order)?;
        }
    }

    state[node] = VisitState::Visited;
    order.push(node);
    Ok(())
}
