use std::ops::Range;

/// Anything holding a vertical scroll offset for the server list.
pub trait ScrollContainer {
    fn scroll_top(&self) -> usize;
    fn set_scroll_top(&mut self, offset: usize);
}

/// Row-based viewport used by the terminal host.
///
/// The stored offset is not clamped when set, so a restored position outlives
/// a temporarily shorter list; [`ListViewport::visible_range`] clamps at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListViewport {
    scroll_top: usize,
    page_size: usize,
}

impl ListViewport {
    pub fn new(page_size: usize) -> Self {
        Self {
            scroll_top: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_top = self.scroll_top.saturating_add(rows);
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_top = self.scroll_top.saturating_sub(rows);
    }

    pub fn visible_range(&self, len: usize) -> Range<usize> {
        let max_start = len.saturating_sub(self.page_size);
        let start = self.scroll_top.min(max_start);
        start..(start + self.page_size).min(len)
    }
}

impl ScrollContainer for ListViewport {
    fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, offset: usize) {
        self.scroll_top = offset;
    }
}
