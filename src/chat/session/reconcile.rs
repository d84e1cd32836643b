//! Decide what a freshly fetched message list does to the pane.
//!
//! Change detection compares lengths only. An edit that keeps the count is
//! missed and any count change counts as activity.

/// Outcome of comparing the cached list with a fetched one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Leave cache and pane untouched.
    Skip,
    /// Replace the cache and re-render.
    Render {
        /// Scroll to the end after rendering.
        scroll: bool,
    },
}

/// Plan a reconcile.
///
/// `at_bottom` is only consulted when a render happens, and must reflect the
/// pane before it is replaced.
pub fn plan_reconcile(
    cached_len: usize,
    fetched_len: usize,
    force: bool,
    at_bottom: impl FnOnce() -> bool,
) -> ReconcileAction {
    if fetched_len == cached_len && !force {
        return ReconcileAction::Skip;
    }
    let was_at_bottom = at_bottom();
    ReconcileAction::Render {
        scroll: was_at_bottom || fetched_len > cached_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_length_skips_without_measuring() {
        let action = plan_reconcile(4, 4, false, || unreachable!("must not measure"));
        assert_eq!(action, ReconcileAction::Skip);
    }

    #[test]
    fn test_growth_scrolls_even_when_scrolled_up() {
        assert_eq!(
            plan_reconcile(4, 5, false, || false),
            ReconcileAction::Render { scroll: true }
        );
    }

    #[test]
    fn test_forced_same_length_keeps_position() {
        assert_eq!(
            plan_reconcile(4, 4, true, || false),
            ReconcileAction::Render { scroll: false }
        );
        assert_eq!(
            plan_reconcile(4, 4, true, || true),
            ReconcileAction::Render { scroll: true }
        );
    }

    #[test]
    fn test_shrink_scrolls_only_at_bottom() {
        assert_eq!(
            plan_reconcile(5, 3, false, || false),
            ReconcileAction::Render { scroll: false }
        );
        assert_eq!(
            plan_reconcile(5, 3, false, || true),
            ReconcileAction::Render { scroll: true }
        );
    }
}
