use crate::format::LogLine;

/// Append-only log. Scrolling is tracked as a distance from the bottom, so
/// `0` means "follow the tail"; every append resets it to `0`.
#[derive(Debug, Default)]
pub struct LogView {
    lines: Vec<LogLine>,
    offset_from_bottom: usize,
}

impl LogView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<I: IntoIterator<Item = LogLine>>(&mut self, lines: I) {
        self.lines.extend(lines);
        self.scroll_to_bottom();
    }

    pub fn push(&mut self, line: LogLine) {
        self.append(std::iter::once(line));
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Number of terminal rows the log occupies before wrapping.
    pub fn row_count(&self) -> usize {
        self.lines
            .iter()
            .map(|line| match line {
                LogLine::Error(text) => text.trim_end().lines().count().max(1),
                _ => 1,
            })
            .sum()
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset_from_bottom = 0;
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_add(rows).min(self.row_count());
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_sub(rows);
    }

    pub fn is_following(&self) -> bool {
        self.offset_from_bottom == 0
    }

    /// First row to show in a viewport `height` rows tall.
    pub fn top_row(&self, height: usize) -> usize {
        self.row_count()
            .saturating_sub(height)
            .saturating_sub(self.offset_from_bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(n: usize) -> Vec<LogLine> {
        (0..n).map(|i| LogLine::Plain(i.to_string())).collect()
    }

    #[test]
    fn follows_tail_after_append() {
        let mut log = LogView::new();
        log.append(plain(30));
        assert_eq!(log.top_row(10), 20);
        log.scroll_up(5);
        assert_eq!(log.top_row(10), 15);
        assert!(!log.is_following());
        log.push(LogLine::Plain("new".into()));
        assert!(log.is_following());
        assert_eq!(log.top_row(10), 21);
    }

    #[test]
    fn scrolling_is_clamped() {
        let mut log = LogView::new();
        log.append(plain(4));
        log.scroll_up(100);
        assert_eq!(log.top_row(2), 0);
        log.scroll_down(100);
        assert!(log.is_following());
        assert_eq!(log.top_row(10), 0);
    }

    #[test]
    fn error_blobs_count_every_line() {
        let mut log = LogView::new();
        log.push(LogLine::Error("a\nb\nc\n".into()));
        log.push(LogLine::Running("pyenv versions".into()));
        assert_eq!(log.row_count(), 4);
        assert_eq!(log.lines().len(), 2);
    }
}
