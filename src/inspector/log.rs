use std::collections::VecDeque;

use crossterm::event::KeyCode;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::debug;

use super::{KeyOutcome, SearchPrompt};
use crate::backend::{LogOptions, LogStreamHandle, SharedBackend};
use crate::model::ResourceKind;

/// Lines drained from the stream per loop iteration.
const DRAIN_PER_POLL: usize = 200;

pub const STREAM_ENDED: &str = "[log stream ended]";

/// Bounded line history; the oldest line goes when full.
#[derive(Debug)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push_line(&mut self, line: String) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }
}

/// Where the stream comes from, kept so it can be reopened.
pub struct LogSource {
    pub backend: SharedBackend,
    pub runtime: tokio::runtime::Handle,
    pub kind: ResourceKind,
    pub id: String,
}

/// Live log tail of a container, compose project or service.
///
/// Auto-scroll and wrap only change rendering. Timestamps are a server
/// side option, so toggling them tears the stream down and opens a new one.
pub struct LogInspector {
    source: Option<LogSource>,
    stream: LogStreamHandle,
    buffer: LogBuffer,
    options: LogOptions,
    ended: bool,
    pub auto_scroll: bool,
    pub wrap: bool,
    /// Lines above the bottom; 0 while following.
    scroll_offset: usize,
    search: SearchPrompt,
}

impl LogInspector {
    pub fn open(source: LogSource, options: LogOptions, capacity: usize) -> Self {
        let stream = source
            .backend
            .stream_logs(source.kind, &source.id, options, &source.runtime);
        debug!(kind = %source.kind, id = %source.id, timestamps = options.timestamps, "log stream opened");
        Self::with_stream(Some(source), stream, options, capacity)
    }

    /// Wrap an existing stream. Without a source, timestamp toggling only
    /// flips the flag.
    pub fn with_stream(
        source: Option<LogSource>,
        stream: LogStreamHandle,
        options: LogOptions,
        capacity: usize,
    ) -> Self {
        Self {
            source,
            stream,
            buffer: LogBuffer::new(capacity),
            options,
            ended: false,
            auto_scroll: true,
            wrap: false,
            scroll_offset: 0,
            search: SearchPrompt::default(),
        }
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    pub fn timestamps(&self) -> bool {
        self.options.timestamps
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn search(&self) -> &SearchPrompt {
        &self.search
    }

    /// Drain pending lines. Returns true when anything changed.
    pub fn poll(&mut self) -> bool {
        if self.ended {
            return false;
        }
        let mut changed = false;
        for _ in 0..DRAIN_PER_POLL {
            match self.stream.receiver.try_recv() {
                Ok(line) => {
                    self.buffer.push_line(line);
                    if !self.auto_scroll {
                        // keep the viewport anchored on the same lines
                        self.scroll_offset += 1;
                    }
                    changed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.buffer.push_line(STREAM_ENDED.to_string());
                    self.ended = true;
                    changed = true;
                    break;
                }
            }
        }
        if self.scroll_offset >= self.buffer.len() {
            self.scroll_offset = self.buffer.len().saturating_sub(1);
        }
        changed
    }

    fn toggle_timestamps(&mut self) {
        self.options.timestamps = !self.options.timestamps;
        let Some(source) = &self.source else { return };
        self.stream.kill();
        self.stream = source
            .backend
            .stream_logs(source.kind, &source.id, self.options, &source.runtime);
        self.buffer.clear();
        self.scroll_offset = 0;
        self.ended = false;
        debug!(id = %source.id, timestamps = self.options.timestamps, "log stream restarted");
    }

    fn scroll_up(&mut self, n: usize) {
        self.auto_scroll = false;
        let max = self.buffer.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + n).min(max);
    }

    fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    pub fn handle_key(&mut self, code: KeyCode, page: usize) -> KeyOutcome {
        if self.search.active {
            self.search.handle_key(code);
            return KeyOutcome::Consumed;
        }

        match code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Close,
            KeyCode::Char('/') => self.search.open(),
            KeyCode::Char('s') => {
                self.auto_scroll = !self.auto_scroll;
                if self.auto_scroll {
                    self.scroll_offset = 0;
                }
            }
            KeyCode::Char('w') => self.wrap = !self.wrap,
            KeyCode::Char('t') => self.toggle_timestamps(),
            KeyCode::Char('C') => {
                self.buffer.clear();
                self.scroll_offset = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(page.max(1)),
            KeyCode::PageDown => self.scroll_down(page.max(1)),
            KeyCode::Char('g') | KeyCode::Home => self.scroll_up(self.buffer.len()),
            KeyCode::Char('G') | KeyCode::End => {
                self.scroll_offset = 0;
                self.auto_scroll = true;
            }
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Consumed
    }

    pub fn close(&mut self) {
        self.stream.kill();
        if let Some(source) = &self.source {
            debug!(id = %source.id, "log stream closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspector(capacity: usize) -> (tokio::sync::mpsc::UnboundedSender<String>, LogInspector) {
        let (tx, handle) = LogStreamHandle::detached();
        let options = LogOptions {
            timestamps: false,
            tail: 10,
        };
        (tx, LogInspector::with_stream(None, handle, options, capacity))
    }

    #[test]
    fn log_buffer_caps_at_capacity() {
        let mut buf = LogBuffer::new(5000);
        for i in 0..5010 {
            buf.push_line(format!("line {}", i));
        }
        assert_eq!(buf.len(), 5000);
        assert_eq!(buf.iter().next(), Some(&"line 10".to_string()));
        assert_eq!(buf.iter().last(), Some(&"line 5009".to_string()));
    }

    #[test]
    fn poll_drains_and_marks_end() {
        let (tx, mut log) = inspector(100);
        tx.send("a".into()).unwrap();
        tx.send("b".into()).unwrap();
        assert!(log.poll());
        assert_eq!(log.buffer().len(), 2);
        drop(tx);
        assert!(log.poll());
        assert_eq!(log.buffer().iter().last().map(String::as_str), Some(STREAM_ENDED));
        assert!(!log.poll());
    }

    #[test]
    fn scrolling_up_disables_autoscroll() {
        let (tx, mut log) = inspector(100);
        for i in 0..20 {
            tx.send(i.to_string()).unwrap();
        }
        log.poll();
        log.handle_key(KeyCode::Up, 10);
        assert!(!log.auto_scroll);
        assert_eq!(log.scroll_offset(), 1);
        log.handle_key(KeyCode::Char('s'), 10);
        assert!(log.auto_scroll);
        assert_eq!(log.scroll_offset(), 0);
    }

    #[test]
    fn render_toggles_and_clear() {
        let (tx, mut log) = inspector(100);
        tx.send("x".into()).unwrap();
        log.poll();
        log.handle_key(KeyCode::Char('w'), 10);
        assert!(log.wrap);
        log.handle_key(KeyCode::Char('t'), 10);
        assert!(log.timestamps());
        log.handle_key(KeyCode::Char('C'), 10);
        assert!(log.buffer().is_empty());
        assert_eq!(log.handle_key(KeyCode::Char('q'), 10), KeyOutcome::Close);
    }
}
