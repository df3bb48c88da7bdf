//! Slash-separated glob patterns, compiled once and matched segment by segment.
//!
//! Within a segment:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character from the set, `[!abc]` / `[^abc]` negate it
//! - `\x` matches `x` literally
//!
//! A segment that is exactly `**` matches zero or more whole path segments.
//! `{a,b}` alternation is expanded before compilation, so one pattern may
//! yield several [`Glob`]s.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use werf_core::path;

use crate::MatcherError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Token {
    Literal(char),
    Any,
    Star,
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::Any => true,
            Token::Star => false,
            Token::Class { negated, ranges } => {
                ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != *negated
            }
        }
    }
}

/// One compiled path segment of a glob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Segment {
    raw: String,
    tokens: Vec<Token>,
}

impl Segment {
    fn compile(raw: &str, pattern: &str) -> Result<Self, MatcherError> {
        let mut tokens = Vec::new();
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            let token = match c {
                '*' => {
                    if tokens.last() == Some(&Token::Star) {
                        continue;
                    }
                    Token::Star
                }
                '?' => Token::Any,
                '\\' => match chars.next() {
                    Some(escaped) => Token::Literal(escaped),
                    None => return Err(MatcherError::glob(pattern, "trailing escape character")),
                },
                '[' => compile_class(&mut chars, pattern)?,
                c => Token::Literal(c),
            };
            tokens.push(token);
        }
        Ok(Self {
            raw: raw.to_owned(),
            tokens,
        })
    }

    fn is_globstar(&self) -> bool {
        self.raw == "**"
    }

    fn contains_globstar(&self) -> bool {
        self.raw.contains("**")
    }

    fn is_star_only(&self) -> bool {
        self.tokens.iter().all(|t| *t == Token::Star)
    }

    /// Iterative wildcard match with single-point backtracking on the last `*`.
    fn matches(&self, input: &str) -> bool {
        let input: Vec<char> = input.chars().collect();
        let tokens = &self.tokens;
        let (mut t, mut i) = (0, 0);
        let mut star: Option<(usize, usize)> = None;

        while i < input.len() {
            match tokens.get(t) {
                Some(Token::Star) => {
                    star = Some((t, i));
                    t += 1;
                    continue;
                }
                Some(token) if token.matches(input[i]) => {
                    t += 1;
                    i += 1;
                    continue;
                }
                _ => {}
            }
            match star {
                Some((star_t, star_i)) => {
                    t = star_t + 1;
                    i = star_i + 1;
                    star = Some((star_t, star_i + 1));
                }
                None => return false,
            }
        }

        tokens[t..].iter().all(|token| *token == Token::Star)
    }
}

fn compile_class(chars: &mut Peekable<Chars<'_>>, pattern: &str) -> Result<Token, MatcherError> {
    let unclosed = || MatcherError::glob(pattern, "unclosed character class");

    let negated = matches!(chars.peek(), Some('!' | '^'));
    if negated {
        chars.next();
    }

    let mut ranges = Vec::new();
    let mut first = true;
    loop {
        let c = chars.next().ok_or_else(unclosed)?;
        if c == ']' && !first {
            break;
        }
        first = false;

        let lo = if c == '\\' {
            chars.next().ok_or_else(unclosed)?
        } else {
            c
        };

        let mut lookahead = chars.clone();
        let is_range = lookahead.next() == Some('-') && !matches!(lookahead.peek(), Some(']') | None);
        let hi = if is_range {
            chars.next();
            match chars.next().ok_or_else(unclosed)? {
                '\\' => chars.next().ok_or_else(unclosed)?,
                c => c,
            }
        } else {
            lo
        };

        if hi < lo {
            return Err(MatcherError::glob(pattern, "character range is out of order"));
        }
        ranges.push((lo, hi));
    }

    Ok(Token::Class { negated, ranges })
}

/// Expand `{a,b}` alternation into plain patterns.
///
/// Nested groups are supported. Unbalanced braces are rejected.
pub fn expand_braces(pattern: &str) -> Result<Vec<String>, MatcherError> {
    let chars: Vec<char> = pattern.chars().collect();

    let mut depth = 0usize;
    let mut group: Option<(usize, usize)> = None;
    let mut open = 0;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '{' => {
                if depth == 0 {
                    open = i;
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(MatcherError::glob(pattern, "unmatched '}'"));
                }
                depth -= 1;
                if depth == 0 && group.is_none() {
                    group = Some((open, i));
                }
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return Err(MatcherError::glob(pattern, "unclosed '{'"));
    }

    let Some((start, end)) = group else {
        return Ok(vec![pattern.to_owned()]);
    };

    let prefix: String = chars[..start].iter().collect();
    let suffix: String = chars[end + 1..].iter().collect();

    let mut expanded = Vec::new();
    for alternative in split_alternatives(&chars[start + 1..end]) {
        expanded.extend(expand_braces(&format!("{prefix}{alternative}{suffix}"))?);
    }
    Ok(expanded)
}

fn split_alternatives(content: &[char]) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut escaped = false;

    for &c in content {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                current.push(c);
            }
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => alternatives.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    alternatives.push(current);
    alternatives
}

/// A normalized, brace-free glob.
///
/// An empty glob denotes the root and matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Glob {
    segments: Vec<Segment>,
}

impl Glob {
    /// Compile a pattern, expanding alternation into one glob per branch.
    ///
    /// ```
    /// use werf_matcher::Glob;
    ///
    /// let globs = Glob::parse("src/{lib,main}.rs").unwrap();
    /// assert_eq!(globs.len(), 2);
    /// assert!(globs[0].matches_path("src/lib.rs"));
    /// assert!(Glob::parse("src/[a-").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Vec<Glob>, MatcherError> {
        expand_braces(pattern)?
            .iter()
            .map(|expanded| Self::parse_expanded(expanded, pattern))
            .collect()
    }

    fn parse_expanded(expanded: &str, pattern: &str) -> Result<Glob, MatcherError> {
        let mut segments: Vec<Segment> = Vec::new();
        for raw in expanded.split('/') {
            match raw {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(MatcherError::glob(pattern, "escapes the repository root"));
                    }
                }
                "**" if segments.last().is_some_and(Segment::is_globstar) => {}
                raw => segments.push(Segment::compile(raw, pattern)?),
            }
        }
        Ok(Glob { segments })
    }

    /// Whether the glob selects everything below the point it applies to
    /// (`**`, `*`, `.`, or empty).
    pub fn is_universal(&self) -> bool {
        Cursor::new(self).is_universal()
    }

    /// Whether `path` is selected by this glob, treating a matched directory
    /// as selecting its whole subtree.
    ///
    /// Tries the glob as-is, and the glob with trailing wildcard segments
    /// stripped as a prefix of `path`, so `dir/*` also selects `dir` itself.
    pub fn matches_path(&self, path: &str) -> bool {
        let path: Vec<&str> = path::segments(path).collect();
        let trimmed = &self.segments[..Cursor::new(self).trimmed_len()];
        match_from(&self.segments, &path, false) || match_from(trimmed, &path, true)
    }

    /// Whether this glob matches `path` or any of its parent directories.
    pub fn matches_path_or_parent(&self, path: &str) -> bool {
        let path: Vec<&str> = path::segments(path).collect();
        match_from(&self.segments, &path, true)
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(".");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&segment.raw)?;
        }
        Ok(())
    }
}

/// Match `pattern` against `path`; with `prefix` the pattern may consume
/// only a leading part of `path`.
///
/// Tracks the set of path positions the pattern can have reached, so each
/// `**` costs one pass over the path instead of a backtracking branch.
fn match_from(pattern: &[Segment], path: &[&str], prefix: bool) -> bool {
    // reachable[i]: the pattern consumed so far can stop right before path[i].
    let mut reachable = vec![false; path.len() + 1];
    reachable[0] = true;
    for segment in pattern {
        let mut next = vec![false; path.len() + 1];
        if segment.is_globstar() {
            let mut seen = false;
            for (slot, &here) in next.iter_mut().zip(&reachable) {
                seen |= here;
                *slot = seen;
            }
        } else {
            for (i, name) in path.iter().enumerate() {
                next[i + 1] = reachable[i] && segment.matches(name);
            }
        }
        reachable = next;
    }
    if prefix {
        reachable.contains(&true)
    } else {
        reachable[path.len()]
    }
}

/// Outcome of feeding one path segment to a glob cursor.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Advance<'a> {
    /// The segment does not match; the glob cannot select anything below.
    Rejected,
    /// The segment matched and more of the glob remains.
    InProgress(Cursor<'a>),
    /// The segment consumed the last glob segment.
    Matched,
}

/// The unconsumed remainder of a glob while walking down a path.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    segments: &'a [Segment],
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(glob: &'a Glob) -> Self {
        Self {
            segments: &glob.segments,
        }
    }

    pub(crate) fn advance(self, segment: &str) -> Advance<'a> {
        let Some((first, rest)) = self.segments.split_first() else {
            return Advance::InProgress(self);
        };
        if !first.matches(segment) {
            return Advance::Rejected;
        }
        // `**` may swallow any number of further segments; keep it pending.
        if first.contains_globstar() {
            return Advance::InProgress(self);
        }
        if rest.is_empty() {
            Advance::Matched
        } else {
            Advance::InProgress(Cursor { segments: rest })
        }
    }

    fn trimmed_len(&self) -> usize {
        self.segments
            .iter()
            .rposition(|segment| !segment.is_star_only())
            .map_or(0, |last| last + 1)
    }

    pub(crate) fn is_universal(&self) -> bool {
        self.trimmed_len() == 0
    }
}

/// Feed every segment of `path` to `globs` and return the cursors still in
/// progress afterwards. Rejected and fully matched globs are dropped.
pub(crate) fn remaining<'a>(globs: impl IntoIterator<Item = &'a Glob>, path: &str) -> Vec<Cursor<'a>> {
    let mut in_progress: Vec<Cursor<'a>> = globs.into_iter().map(Cursor::new).collect();
    for segment in path::segments(path) {
        in_progress = in_progress
            .into_iter()
            .filter_map(|cursor| match cursor.advance(segment) {
                Advance::InProgress(next) => Some(next),
                Advance::Rejected | Advance::Matched => None,
            })
            .collect();
        if in_progress.is_empty() {
            break;
        }
    }
    in_progress
}

/// Descent is needed when some glob is still pending below `path` and none
/// of the pending globs already selects everything there.
pub(crate) fn needs_descent(in_progress: &[Cursor<'_>]) -> bool {
    !in_progress.is_empty() && !in_progress.iter().any(Cursor::is_universal)
}
