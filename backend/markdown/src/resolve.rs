//! Step Resolver
//!
//! Binds every reveal element of a slide to a concrete step. Sequential and
//! explicit numbers share one numberspace: the sequential counter starts at 1,
//! advances only on sequential elements and never skips numbers that explicit
//! elements already use, so collisions simply share a step.

use stardeck_core::{Diagnostic, DiagnosticKind, ResolvedReveal, RevealKind, StepSpec};

use crate::ir::{reveals, Node};

/// Step assignment for one slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// One entry per reveal node, in document order.
    pub reveals: Vec<ResolvedReveal>,
    pub max_step: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn resolve(nodes: &[Node]) -> Resolution {
    let mut next_sequential = 1;
    let mut previous: Option<usize> = None;
    let mut out = Resolution::default();

    for (ordinal, node) in reveals(nodes).enumerate() {
        let visibility = if node.hide { RevealKind::Hide } else { RevealKind::Show };

        let (step, until, kind, shares_previous) = if node.after {
            match previous {
                Some(step) => (step, None, visibility, true),
                None => {
                    out.diagnostics.push(Diagnostic::new(
                        node.line,
                        DiagnosticKind::OrphanAfter,
                        "<after> has no reveal element before it; showing it at step 1",
                    ));
                    (1, None, visibility, false)
                }
            }
        } else {
            match node.spec {
                StepSpec::Sequential => {
                    let step = next_sequential;
                    next_sequential += 1;
                    (step, None, visibility, false)
                }
                StepSpec::Explicit { step } => (step, None, visibility, false),
                StepSpec::Range { from, until } => (from, Some(until), RevealKind::Range, false),
            }
        };

        let reveal = ResolvedReveal {
            ordinal,
            step,
            until,
            kind,
            shares_previous,
            line: node.line,
        };
        out.max_step = out.max_step.max(reveal.highest_step());
        previous = Some(step);
        out.reveals.push(reveal);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::click::parse_clicks;

    fn resolve_body(body: &str) -> Resolution {
        resolve(&parse_clicks(body).nodes)
    }

    fn steps(r: &Resolution) -> Vec<usize> {
        r.reveals.iter().map(|r| r.step).collect()
    }

    #[test]
    fn test_no_markup_has_zero_max_step() {
        let r = resolve_body("# Plain slide\n\nNothing to reveal.");
        assert!(r.reveals.is_empty());
        assert_eq!(r.max_step, 0);
    }

    #[test]
    fn test_sequential_numbering() {
        let r = resolve_body("<click>A</click>\n<click>B</click>\n<click>C</click>");
        assert_eq!(steps(&r), vec![1, 2, 3]);
        assert_eq!(r.max_step, 3);
    }

    #[test]
    fn test_explicit_collides_with_sequential() {
        let r = resolve_body(r#"<click>A</click><click at="1">B</click>"#);
        assert_eq!(steps(&r), vec![1, 1]);
        assert_eq!(r.max_step, 1);
    }

    #[test]
    fn test_sequential_does_not_skip_explicit() {
        let r = resolve_body(r#"<click>A</click><click at="5">B</click><click>C</click>"#);
        assert_eq!(steps(&r), vec![1, 5, 2]);
        assert_eq!(r.max_step, 5);
    }

    #[test]
    fn test_range_window_and_max_step() {
        let r = resolve_body(r#"<click at="2-4">R</click>"#);
        let range = &r.reveals[0];
        assert_eq!(range.kind, RevealKind::Range);
        let visible: Vec<bool> = (0..6).map(|s| range.is_visible(s)).collect();
        assert_eq!(visible, vec![false, false, true, true, false, false]);
        assert_eq!(r.max_step, 4);
    }

    #[test]
    fn test_range_does_not_advance_counter() {
        let r = resolve_body(r#"<click at="2-4">R</click><click>A</click>"#);
        assert_eq!(steps(&r), vec![2, 1]);
    }

    #[test]
    fn test_hide_after_swap() {
        let r = resolve_body("<click hide>Old</click>\n<after>New</after>");
        let (hide, after) = (&r.reveals[0], &r.reveals[1]);
        assert_eq!((hide.step, after.step), (1, 1));
        assert!(after.shares_previous);
        assert_eq!(r.max_step, 1);
        for step in 0..3 {
            assert_eq!(hide.is_visible(step), !after.is_visible(step), "step {step}");
        }
        assert!(hide.is_visible(0));
        assert!(after.is_visible(1));
    }

    #[test]
    fn test_hide_at_three_with_after() {
        let r = resolve_body("<click at=\"3\" hide>H</click><after>A</after>");
        let (hide, after) = (&r.reveals[0], &r.reveals[1]);
        assert!((0..3).all(|s| hide.is_visible(s)));
        assert!((3..6).all(|s| !hide.is_visible(s)));
        assert!((0..3).all(|s| !after.is_visible(s)));
        assert!((3..6).all(|s| after.is_visible(s)));
    }

    #[test]
    fn test_after_does_not_consume_step() {
        let r = resolve_body("<click>A</click><after>B</after><click>C</click>");
        assert_eq!(steps(&r), vec![1, 1, 2]);
        assert_eq!(r.max_step, 2);
    }

    #[test]
    fn test_orphan_after() {
        let r = resolve_body("Intro\n<after>B</after>");
        assert_eq!(steps(&r), vec![1]);
        assert_eq!(r.diagnostics.len(), 1);
        assert_eq!(r.diagnostics[0].kind, DiagnosticKind::OrphanAfter);
        assert_eq!(r.diagnostics[0].line, 1);
    }

    #[test]
    fn test_nested_reveal_does_not_double_count() {
        let r = resolve_body("<click>Outer <click>Inner</click></click>\n<click>Next</click>");
        assert_eq!(steps(&r), vec![1, 2]);
        assert_eq!(r.max_step, 2);
    }

    #[test]
    fn test_bulk_clicks_take_sequential_steps() {
        let r = resolve_body("<click>A</click>\n<clicks>\n\nB\n\nC\n\n</clicks>");
        assert_eq!(steps(&r), vec![1, 2, 3]);
    }

    #[test]
    fn test_max_step_is_max_of_bound_steps() {
        let bodies = [
            "<click at=\"7\">A</click><click>B</click>",
            "<click at=\"1-3\">A</click><click at=\"2\">B</click>",
            "<click>A</click><click>B</click><click at=\"0\">C</click>",
        ];
        for body in bodies {
            let r = resolve_body(body);
            let expected = r.reveals.iter().map(|r| r.highest_step()).max().unwrap_or(0);
            assert_eq!(r.max_step, expected, "{body}");
        }
    }
}
