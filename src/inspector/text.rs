use crossterm::event::KeyCode;

use super::{KeyOutcome, SearchPrompt};

/// Scrollable, searchable text: describe output, a container environment
/// or the help page.
pub struct TextInspector {
    lines: Vec<String>,
    loading: bool,
    scroll: usize,
    search: SearchPrompt,
    matches: Vec<usize>,
    current: Option<usize>,
}

impl TextInspector {
    /// Waiting for content from a background describe.
    pub fn loading() -> Self {
        Self {
            lines: Vec::new(),
            loading: true,
            scroll: 0,
            search: SearchPrompt::default(),
            matches: Vec::new(),
            current: None,
        }
    }

    pub fn with_content(content: &str) -> Self {
        let mut inspector = Self::loading();
        inspector.set_content(content);
        inspector
    }

    pub fn set_content(&mut self, content: &str) {
        self.lines = content.lines().map(str::to_string).collect();
        self.loading = false;
        self.scroll = 0;
        self.recompute_matches();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn search(&self) -> &SearchPrompt {
        &self.search
    }

    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    /// Line index of the current match.
    pub fn current_match(&self) -> Option<usize> {
        self.current.and_then(|i| self.matches.get(i).copied())
    }

    fn max_scroll(&self, page: usize) -> usize {
        self.lines.len().saturating_sub(page.max(1))
    }

    fn recompute_matches(&mut self) {
        let query = self.search.query.to_lowercase();
        self.matches = if query.is_empty() {
            Vec::new()
        } else {
            self.lines
                .iter()
                .enumerate()
                .filter(|(_, l)| l.to_lowercase().contains(&query))
                .map(|(i, _)| i)
                .collect()
        };
        self.current = if self.matches.is_empty() { None } else { Some(0) };
        if let Some(line) = self.current_match() {
            self.scroll = line;
        }
    }

    fn step_match(&mut self, forward: bool) {
        let n = self.matches.len();
        if n == 0 {
            return;
        }
        let next = match self.current {
            None => 0,
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
        };
        self.current = Some(next);
        self.scroll = self.matches[next];
    }

    pub fn handle_key(&mut self, code: KeyCode, page: usize) -> KeyOutcome {
        if self.search.active {
            if self.search.handle_key(code) {
                self.recompute_matches();
            }
            return KeyOutcome::Consumed;
        }

        match code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Close,
            KeyCode::Char('/') => self.search.open(),
            KeyCode::Char('n') => self.step_match(true),
            KeyCode::Char('N') => self.step_match(false),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = (self.scroll + 1).min(self.max_scroll(page))
            }
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(page),
            KeyCode::PageDown => self.scroll = (self.scroll + page).min(self.max_scroll(page)),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = self.max_scroll(page),
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(inspector: &mut TextInspector, s: &str) {
        inspector.handle_key(KeyCode::Char('/'), 10);
        for c in s.chars() {
            inspector.handle_key(KeyCode::Char(c), 10);
        }
        inspector.handle_key(KeyCode::Enter, 10);
    }

    #[test]
    fn search_is_case_insensitive_and_cycles() {
        let mut t = TextInspector::with_content("Image: nginx\nname: web\nNGINX_PORT=80\nend");
        typed(&mut t, "nginx");
        assert_eq!(t.matches(), &[0, 2]);
        assert_eq!(t.current_match(), Some(0));
        t.handle_key(KeyCode::Char('n'), 10);
        assert_eq!(t.current_match(), Some(2));
        assert_eq!(t.scroll(), 2);
        t.handle_key(KeyCode::Char('n'), 10);
        assert_eq!(t.current_match(), Some(0));
        t.handle_key(KeyCode::Char('N'), 10);
        assert_eq!(t.current_match(), Some(2));
    }

    #[test]
    fn escape_in_search_clears_query() {
        let mut t = TextInspector::with_content("a\nb");
        t.handle_key(KeyCode::Char('/'), 10);
        t.handle_key(KeyCode::Char('a'), 10);
        assert_eq!(t.handle_key(KeyCode::Esc, 10), KeyOutcome::Consumed);
        assert!(t.matches().is_empty());
        assert_eq!(t.handle_key(KeyCode::Esc, 10), KeyOutcome::Close);
    }

    #[test]
    fn scroll_is_bounded_by_page() {
        let content: Vec<String> = (0..30).map(|i| i.to_string()).collect();
        let mut t = TextInspector::with_content(&content.join("\n"));
        t.handle_key(KeyCode::Char('G'), 10);
        assert_eq!(t.scroll(), 20);
        t.handle_key(KeyCode::Down, 10);
        assert_eq!(t.scroll(), 20);
        t.handle_key(KeyCode::Char('g'), 10);
        assert_eq!(t.scroll(), 0);
    }
}
