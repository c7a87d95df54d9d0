// src/extract/runs.rs
use crate::extract::types::{Marker, Run};

/// Group markers into maximal same-color runs, single pass, no lookahead.
/// Duplicate values are kept: a repeated ball is part of the draw.
pub fn group_runs(markers: &[Marker]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut current: Option<Run> = None;

    for m in markers {
        let value = m.text.trim();
        if value.is_empty() {
            continue;
        }
        match current.as_mut() {
            Some(run) if run.color == m.color => run.values.push(value.to_string()),
            _ => {
                if let Some(done) = current.take() {
                    if !done.values.is_empty() {
                        runs.push(done);
                    }
                }
                current = Some(Run {
                    color: m.color.clone(),
                    values: vec![value.to_string()],
                });
            }
        }
    }

    if let Some(done) = current {
        if !done.values.is_empty() {
            runs.push(done);
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: &[(&str, &str)]) -> Vec<Marker> {
        items
            .iter()
            .enumerate()
            .map(|(i, (c, t))| Marker::new(*c, *t, i))
            .collect()
    }

    #[test]
    fn duplicates_are_preserved() {
        let runs = group_runs(&seq(&[("gray", "1"), ("gray", "1"), ("gray", "2")]));
        assert_eq!(
            runs,
            vec![Run {
                color: "gray".into(),
                values: vec!["1".into(), "1".into(), "2".into()],
            }]
        );
    }

    #[test]
    fn color_change_closes_run() {
        let runs = group_runs(&seq(&[("gray", "1"), ("yellow", "2"), ("gray", "3")]));
        let shape: Vec<_> = runs
            .iter()
            .map(|r| (r.color.as_str(), r.values.clone()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("gray", vec!["1".to_string()]),
                ("yellow", vec!["2".to_string()]),
                ("gray", vec!["3".to_string()]),
            ]
        );
    }

    #[test]
    fn blank_markers_neither_start_nor_break_a_run() {
        let runs = group_runs(&seq(&[("gray", "1"), ("blue", "  "), ("gray", "2")]));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].values, vec!["1", "2"]);
    }

    #[test]
    fn empty_input_yields_no_runs() {
        assert!(group_runs(&[]).is_empty());
    }
}
