//! Bracket validity scan shared by structure lookup and template values
//!
//! `[` and `(` are tracked independently. Each kind may open, fill and fully
//! close at most once at the outermost level, so `[0](1)` and `(1)[0]` are
//! valid while `[0][1]` and `(a)(b)` are not. Nested brackets of the same kind
//! do not count as a second opening. Unmatched closers or leftovers are invalid.

#[derive(Debug, Default, Clone, Copy)]
struct Depth {
    depth: i32,
    openings: u32,
}

impl Depth {
    fn open(&mut self) -> bool {
        if self.depth == 0 {
            self.openings += 1;
        }
        self.depth += 1;
        self.openings <= 1
    }

    fn close(&mut self) -> bool {
        self.depth -= 1;
        self.depth >= 0
    }
}

/// Whether `text` satisfies the single-open/close rule
pub fn brackets_valid(text: &str) -> bool {
    let mut square = Depth::default();
    let mut round = Depth::default();

    for ch in text.chars() {
        let ok = match ch {
            '[' => square.open(),
            ']' => square.close(),
            '(' => round.open(),
            ')' => round.close(),
            _ => true,
        };
        if !ok {
            return false;
        }
    }

    square.depth == 0 && round.depth == 0
}

/// Bracket validity of a text grown one fragment at a time from the right.
///
/// Gives the same answer as [`brackets_valid`] on the text prepended so far
/// without rescanning it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuffixBrackets {
    square: SuffixDepth,
    round: SuffixDepth,
}

impl SuffixBrackets {
    pub fn prepend(&mut self, text: &str) {
        for ch in text.chars().rev() {
            match ch {
                '[' => self.square.prepend(1),
                ']' => self.square.prepend(-1),
                '(' => self.round.prepend(1),
                ')' => self.round.prepend(-1),
                _ => {}
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.square.is_valid() && self.round.is_valid()
    }
}

/// One bracket kind seen from the right. `total` is the depth change of the
/// whole suffix; an opener starts an outermost span when the suffix from it
/// on nets to zero.
#[derive(Debug, Default, Clone, Copy)]
struct SuffixDepth {
    total: i32,
    /// Largest `total` reached; above zero means a closer without opener
    peak: i32,
    outer_openings: u32,
}

impl SuffixDepth {
    fn prepend(&mut self, delta: i32) {
        self.total += delta;
        self.peak = self.peak.max(self.total);
        if delta > 0 && self.total == 0 {
            self.outer_openings += 1;
        }
    }

    fn is_valid(&self) -> bool {
        self.total == 0 && self.peak == 0 && self.outer_openings <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffixes_agree(text: &str) {
        let mut suffix = SuffixBrackets::default();
        assert!(suffix.is_valid());
        for (start, ch) in text.char_indices().rev() {
            let mut buf = [0u8; 4];
            suffix.prepend(ch.encode_utf8(&mut buf));
            assert_eq!(
                suffix.is_valid(),
                brackets_valid(&text[start..]),
                "suffix {:?}",
                &text[start..]
            );
        }
    }

    #[test]
    fn test_suffix_tracking_matches_full_scan() {
        for text in [
            "%0%[%1%](%2%).member",
            "%0%[%1%][%2%].member",
            "f(a)(b)",
            "x[y[0]]",
            "#cast(\"T\",f(%0%))",
            "][",
            "[(])",
            "((a)(b))",
            "a)(b",
        ] {
            suffixes_agree(text);
        }
    }

    #[test]
    fn test_no_brackets_is_valid() {
        assert!(brackets_valid(""));
        assert!(brackets_valid("%0%.name"));
    }

    #[test]
    fn test_one_of_each_kind_in_either_order() {
        assert!(brackets_valid("%0%[%1%](%2%).member"));
        assert!(brackets_valid("%0%(%2%)[%1%]"));
    }

    #[test]
    fn test_repeated_kind_is_invalid() {
        assert!(!brackets_valid("%0%[%1%][%2%].member"));
        assert!(!brackets_valid("f(a)(b)"));
    }

    #[test]
    fn test_nesting_counts_once() {
        assert!(brackets_valid("#cast(\"T\",f(%0%))"));
        assert!(brackets_valid("x[y[0]]"));
    }

    #[test]
    fn test_unbalanced_is_invalid() {
        assert!(!brackets_valid(")"));
        assert!(!brackets_valid("%2%).member"));
        assert!(!brackets_valid("(a"));
        assert!(!brackets_valid("]["));
    }

    #[test]
    fn test_kinds_are_independent() {
        assert!(brackets_valid("[(])"));
    }
}
