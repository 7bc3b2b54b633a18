//! Root scheduling
//!
//! Orders registered roots so that every root comes after the roots it depends on, using
//! Kahn's algorithm with a min-heap on registration index: roots without a dependency
//! relationship keep their registration order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::{debug, warn};

use crate::error::{EvalError, EvalResult};
use crate::root::RootRef;

/// Sort `roots` by dependencies.
///
/// Dependencies are matched by [`crate::Root::dsl_name`]. Fails with
/// [`EvalError::MissingDependency`] when a dependency was never registered and with
/// [`EvalError::DependencyCycle`] when the dependencies form a cycle.
pub fn sort_roots(roots: &[RootRef]) -> EvalResult<Vec<RootRef>> {
    let n = roots.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    // Step 1: index roots by name, first registration wins
    let names: Vec<String> = roots.iter().map(|r| r.dsl_name()).collect();
    let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (idx, name) in names.iter().enumerate() {
        by_name.entry(name.as_str()).or_insert(idx);
    }

    // Step 2: adjacency list and in-degrees
    // adj[i] = roots depending on root i, deps[i] = roots root i depends on
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<usize> = vec![0; n];

    for (idx, root) in roots.iter().enumerate() {
        for dep in root.depends_on() {
            let dep_name = dep.dsl_name();
            let Some(&dep_idx) = by_name.get(dep_name.as_str()) else {
                warn!(root = %names[idx], dependency = %dep_name, "dependency is not registered");
                return Err(EvalError::MissingDependency {
                    root: names[idx].clone(),
                    dependency: dep_name,
                });
            };
            adj[dep_idx].push(idx);
            deps[idx].push(dep_idx);
            in_degree[idx] += 1;
        }
    }

    // Step 3: Kahn's algorithm, lowest registration index first
    let mut heap: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(idx, _)| Reverse(idx))
        .collect();

    let mut sorted: Vec<usize> = Vec::with_capacity(n);
    while let Some(Reverse(idx)) = heap.pop() {
        sorted.push(idx);
        for &next in &adj[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                heap.push(Reverse(next));
            }
        }
    }

    // Step 4: anything left over sits on or behind a cycle
    if sorted.len() != n {
        let cycle: Vec<String> = trace_cycle(&in_degree, &deps)
            .into_iter()
            .map(|idx| names[idx].clone())
            .collect();
        warn!(cycle = %cycle.join(" -> "), "dependency cycle between roots");
        return Err(EvalError::DependencyCycle { cycle });
    }

    debug!(order = ?sorted.iter().map(|&i| names[i].as_str()).collect::<Vec<_>>(), "sorted roots");
    Ok(sorted.into_iter().map(|idx| roots[idx].clone()).collect())
}

/// Follow unresolved dependency edges until a root repeats and return that loop, closed by
/// its first root. Every unresolved root has at least one unresolved dependency, so the walk
/// always ends on a cycle.
fn trace_cycle(in_degree: &[usize], deps: &[Vec<usize>]) -> Vec<usize> {
    let unresolved = |idx: usize| in_degree[idx] > 0;
    let Some(start) = (0..in_degree.len()).find(|&idx| unresolved(idx)) else {
        return Vec::new();
    };

    let mut path: Vec<usize> = Vec::new();
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&pos) = position.get(&current) {
            let mut cycle = path.split_off(pos);
            cycle.push(current);
            return cycle;
        }
        position.insert(current, path.len());
        path.push(current);
        match deps[current].iter().copied().find(|&dep| unresolved(dep)) {
            Some(next) => current = next,
            None => return path,
        }
    }
}
