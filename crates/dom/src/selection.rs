use crate::document::Document;
use crate::range::Range;
use crate::{DomError, NodeId};

/// The user's text selection, holding at most one range like every major browser does.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    range: Option<Range>,
}

impl Selection {
    pub fn range_count(&self) -> usize {
        usize::from(self.range.is_some())
    }

    /// An empty selection counts as collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.range.map_or(true, |range| range.is_collapsed())
    }

    /// Returns a copy of the range at `index`, changing it does not change the selection.
    pub fn range_at(&self, index: usize) -> Option<Range> {
        if index == 0 {
            self.range
        } else {
            None
        }
    }

    /// Replaces the current range, if any.
    pub fn add_range(&mut self, range: Range) {
        self.range.replace(range);
    }

    pub fn remove_all_ranges(&mut self) {
        self.range.take();
    }
}

impl Document {
    /// Selects from `(start_node, start_offset)` to `(end_node, end_offset)`, the way a user
    /// dragging the mouse over the page would.
    pub fn select(
        &mut self,
        start_node: NodeId,
        start_offset: usize,
        end_node: NodeId,
        end_offset: usize,
    ) -> Result<(), DomError> {
        let range = self.create_range(start_node, start_offset, end_node, end_offset)?;
        self.selection_mut().add_range(range);
        Ok(())
    }
}
