use crate::block::ListKind;

/// List depth and kind at some point of the block traversal.
///
/// A plain value threaded through the recursion: entering a list returns a
/// new nesting and leaves the caller's copy untouched, so the outer depth and
/// kind are back in effect as soon as the inner list's dispatch returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListNesting {
    depth: usize,
    kind: Option<ListKind>,
}

impl ListNesting {
    /// Nesting outside of any list.
    pub fn top() -> Self {
        Self::default()
    }

    pub fn enter(&self, kind: ListKind) -> ListNesting {
        ListNesting {
            depth: self.depth + 1,
            kind: Some(kind),
        }
    }

    /// Kind of the innermost list, `None` outside of any list.
    pub fn kind(&self) -> Option<ListKind> {
        self.kind
    }

    /// Zero-based level for list items emitted at this nesting, `None`
    /// outside of any list.
    pub fn level(&self) -> Option<usize> {
        self.depth.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn top_has_no_level() {
        let top = ListNesting::top();
        assert_eq!(top.level(), None);
        assert_eq!(top.kind(), None);
    }

    #[test]
    fn entering_leaves_outer_untouched() {
        let top = ListNesting::top();
        let outer = top.enter(ListKind::Unordered);
        assert_eq!(outer.level(), Some(0));

        let inner = outer.enter(ListKind::Ordered);
        assert_eq!(inner.level(), Some(1));
        assert_eq!(inner.kind(), Some(ListKind::Ordered));

        assert_eq!(outer.level(), Some(0));
        assert_eq!(outer.kind(), Some(ListKind::Unordered));
        assert_eq!(top, ListNesting::top());
    }
}
