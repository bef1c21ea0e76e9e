use once_cell::sync::Lazy;
use regex::Regex;

static HYPHENATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+(?:-\w+)+").expect("valid hyphenated regex"));

static CONTRACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+['’]\w+").expect("valid contraction regex"));

/// Digits followed by a unit, `100kg` or `50%`.
///
/// Anchored with a leading `\b`, unlike the plain `\d+[\w%]+`: the digits inside a word such
/// as `abc123def` never start a unit token, the word expands as a whole instead.
static NUMERIC_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+[\w%]+").expect("valid numeric unit regex"));

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://|www\.)\S+").expect("valid url regex"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").expect("valid email regex")
});

/// Kind of a multi-char span treated as a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `state-of-the-art`
    Hyphenated,
    /// `can't`
    Contraction,
    /// `100kg`, `50%`
    NumericUnit,
    /// `https://example.com/path`, `www.example.com`
    Url,
    /// `someone@example.com`
    Email,
}

impl TokenKind {
    /// The order the patterns are tried in, the first applicable one wins.
    pub const ALL: [TokenKind; 5] = [
        Self::Hyphenated,
        Self::Contraction,
        Self::NumericUnit,
        Self::Url,
        Self::Email,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            Self::Hyphenated => &HYPHENATED,
            Self::Contraction => &CONTRACTION,
            Self::NumericUnit => &NUMERIC_UNIT,
            Self::Url => &URL,
            Self::Email => &EMAIL,
        }
    }

    /// Returns all the spans of this kind in `text`, in char offsets.
    fn find_all(self, text: &str) -> impl Iterator<Item = SpecialToken> + '_ {
        self.regex().find_iter(text).map(move |mat| {
            let start = text[..mat.start()].chars().count();
            let end = start + utils::char_count(mat.as_str());
            SpecialToken {
                start,
                end,
                kind: self,
            }
        })
    }
}

/// Direction to snap an offset towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Snap the start of a selection to the start of the token.
    Backward,
    /// Snap the end of a selection to the end of the token.
    Forward,
}

/// A matched special token, `[start, end)` in char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialToken {
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

impl SpecialToken {
    /// Whether an offset on the given side of a selection falls into this token.
    ///
    /// A selection starting right at `start` or ending right at `end` is already aligned.
    fn applies_to(&self, offset: usize, direction: Direction) -> bool {
        match direction {
            Direction::Backward => self.start < offset && offset <= self.end,
            Direction::Forward => self.start <= offset && offset < self.end,
        }
    }

    fn snap(&self, direction: Direction) -> usize {
        match direction {
            Direction::Backward => self.start,
            Direction::Forward => self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch {
    /// Snapped offset, or the input offset when nothing matched.
    pub new_offset: usize,
    pub matched: bool,
    pub kind: Option<TokenKind>,
}

/// Snaps `offset` to the edge of the special token covering it, if any.
///
/// The patterns are tried in [`TokenKind::ALL`] order and the first one with an applicable
/// match wins, a later pattern producing a longer span does not override it.
pub fn match_special_token(text: &str, offset: usize, direction: Direction) -> TokenMatch {
    TokenKind::ALL
        .into_iter()
        .find_map(|kind| {
            kind.find_all(text)
                .find(|token| token.applies_to(offset, direction))
        })
        .map(|token| TokenMatch {
            new_offset: token.snap(direction),
            matched: true,
            kind: Some(token.kind),
        })
        .unwrap_or(TokenMatch {
            new_offset: offset,
            matched: false,
            kind: None,
        })
}

/// Returns every special token in `text`, grouped by kind in pattern order.
pub fn special_tokens(text: &str) -> Vec<SpecialToken> {
    TokenKind::ALL
        .into_iter()
        .flat_map(|kind| kind.find_all(text).collect::<Vec<_>>())
        .collect()
}
