//! Run order for programs that read each other's results.

use std::collections::{BTreeMap, VecDeque};

use crate::error::{EngineError, EngineResult};

/// Orders `programs` so every program runs after the programs it references.
///
/// Each entry is a code and the codes it references. References to codes
/// outside the list are ignored. Programs with no ordering constraint keep
/// their input order.
///
/// # Example
///
/// ```
/// use benefits_engine::calculation::run_order;
///
/// let order = run_order(&[
///     ("il_moms_and_babies", &["il_family_care"][..]),
///     ("il_family_care", &["medicaid"][..]),
///     ("medicaid", &[][..]),
/// ])?;
/// assert_eq!(order, vec!["medicaid", "il_family_care", "il_moms_and_babies"]);
/// # Ok::<(), benefits_engine::error::EngineError>(())
/// ```
pub fn run_order<'a>(programs: &[(&'a str, &[&str])]) -> EngineResult<Vec<&'a str>> {
    let index: BTreeMap<&str, usize> = programs
        .iter()
        .enumerate()
        .map(|(i, (code, _))| (*code, i))
        .collect();

    let mut blocking = vec![0usize; programs.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); programs.len()];
    for (i, (_, references)) in programs.iter().enumerate() {
        for reference in references.iter() {
            if let Some(&j) = index.get(reference) {
                blocking[i] += 1;
                dependents[j].push(i);
            }
        }
    }

    let mut ready: VecDeque<usize> = (0..programs.len()).filter(|&i| blocking[i] == 0).collect();
    let mut order = Vec::with_capacity(programs.len());

    while let Some(i) = ready.pop_front() {
        order.push(programs[i].0);
        for &d in &dependents[i] {
            blocking[d] -= 1;
            if blocking[d] == 0 {
                ready.push_back(d);
            }
        }
    }

    if order.len() < programs.len() {
        return Err(EngineError::DependencyCycle {
            cycle: find_cycle(programs, &index, &blocking),
        });
    }

    Ok(order)
}

/// Walks references among unscheduled programs until one repeats.
fn find_cycle(
    programs: &[(&str, &[&str])],
    index: &BTreeMap<&str, usize>,
    blocking: &[usize],
) -> Vec<String> {
    let Some(start) = (0..programs.len()).find(|&i| blocking[i] > 0) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let next = programs[current]
            .1
            .iter()
            .filter_map(|r| index.get(r).copied())
            .find(|&j| blocking[j] > 0);
        let Some(next) = next else {
            return path.iter().map(|&i| programs[i].0.to_string()).collect();
        };
        if let Some(pos) = path.iter().position(|&i| i == next) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|&i| programs[i].0.to_string()).collect();
            cycle.push(programs[next].0.to_string());
            return cycle;
        }
        path.push(next);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_independent_programs_keep_input_order() {
        let order = run_order(&[("snap", &[][..]), ("wic", &[][..]), ("aca", &[][..])]).unwrap();
        assert_eq!(order, vec!["snap", "wic", "aca"]);
    }

    #[test]
    fn test_reference_runs_first() {
        let order = run_order(&[
            ("co_weatherization_assistance", &["snap"][..]),
            ("snap", &[][..]),
        ])
        .unwrap();
        assert_eq!(order, vec!["snap", "co_weatherization_assistance"]);
    }

    #[test]
    fn test_unknown_reference_is_ignored() {
        let order = run_order(&[("il_family_care", &["medicaid"][..])]).unwrap();
        assert_eq!(order, vec!["il_family_care"]);
    }

    #[test]
    fn test_cycle_is_named() {
        let result = run_order(&[
            ("standalone", &[][..]),
            ("a", &["b"][..]),
            ("b", &["c"][..]),
            ("c", &["a"][..]),
        ]);
        match result {
            Err(EngineError::DependencyCycle { cycle }) => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("Expected DependencyCycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let result = run_order(&[("a", &["a"][..])]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Program dependency cycle: a -> a"
        );
    }
}
