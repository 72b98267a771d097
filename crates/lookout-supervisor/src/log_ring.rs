use std::collections::VecDeque;

/// Bounded ring of free-text progress lines for one tenant session. Grows to
/// the cap, then sheds the oldest half in one cut rather than line-by-line.
pub struct LogRing {
    lines: VecDeque<String>,
}

const CAP: usize = 1000;
const KEEP: usize = 500;

impl LogRing {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::new(),
        }
    }

    pub fn push(&mut self, line: String) {
        self.lines.push_back(line);
        if self.lines.len() > CAP {
            let excess = self.lines.len() - KEEP;
            self.lines.drain(..excess);
        }
    }

    /// The most recent `limit` lines, oldest first.
    pub fn tail(&self, limit: usize) -> Vec<String> {
        let skip = self.lines.len().saturating_sub(limit);
        self.lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_tail() {
        let mut ring = LogRing::new();
        for i in 0..10 {
            ring.push(format!("line {i}"));
        }
        assert_eq!(ring.tail(3), vec!["line 7", "line 8", "line 9"]);
        assert_eq!(ring.tail(100).len(), 10);
    }

    #[test]
    fn test_overflow_sheds_to_keep_mark() {
        let mut ring = LogRing::new();
        for i in 0..1001 {
            ring.push(format!("line {i}"));
        }
        assert_eq!(ring.len(), 500);
        assert_eq!(ring.tail(1), vec!["line 1000"]);
    }
}
