// Word Splitter

/// What separates two words
#[derive(Debug, Clone, Copy)]
pub enum Separator {
    /// A single character such as `'='`
    Char(char),
    /// Any Unicode whitespace
    Whitespace,
    /// Every character the predicate accepts
    Predicate(fn(char) -> bool),
}

impl Separator {
    #[inline]
    pub fn matches(&self, c: char) -> bool {
        match *self {
            Self::Char(sep) => c == sep,
            Self::Whitespace => c.is_whitespace(),
            Self::Predicate(f) => f(c),
        }
    }
}

impl From<char> for Separator {
    #[inline]
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<fn(char) -> bool> for Separator {
    #[inline]
    fn from(f: fn(char) -> bool) -> Self {
        Self::Predicate(f)
    }
}

/// Iterator over at most `max` non-empty words of a string.
///
/// Runs of separators (leading ones included) never produce empty words.
/// Once `max` words have been produced the remaining text is left
/// unconsumed and can be inspected with [`Words::rest`].
///
/// ```
/// use wakeboot::words::Words;
///
/// let mut words = Words::new("  a  b c", 2, ' ');
/// assert_eq!(words.next(), Some("a"));
/// assert_eq!(words.next(), Some("b"));
/// assert_eq!(words.next(), None);
/// assert_eq!(words.rest(), " c");
/// ```
#[derive(Debug, Clone)]
pub struct Words<'a> {
    rest: &'a str,
    remaining: usize,
    separator: Separator,
}

impl<'a> Words<'a> {
    #[inline]
    pub fn new<S: Into<Separator>>(text: &'a str, max: usize, separator: S) -> Self {
        Self {
            rest: text,
            remaining: max,
            separator: separator.into(),
        }
    }

    /// Text not consumed so far.
    #[inline]
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    /// Returns `true` if the word limit was hit before the text ran out.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        let separator = self.separator;
        self.remaining == 0 && !self.rest.trim_matches(|c| separator.matches(c)).is_empty()
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let separator = self.separator;
        let text = self.rest.trim_start_matches(|c| separator.matches(c));
        if text.is_empty() {
            self.rest = text;
            return None;
        }
        let end = text.find(|c| separator.matches(c)).unwrap_or(text.len());
        let (word, rest) = text.split_at(end);
        self.rest = rest;
        self.remaining -= 1;
        Some(word)
    }
}
