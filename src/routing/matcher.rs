//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse CDN-style path patterns
//! - Match request paths against them
//!
//! # Design Decisions
//! - Matching is case-sensitive
//! - `*` matches any run of characters, `/` included; `?` matches exactly one
//! - Everything else is literal
//! - Iterative wildcard matching that backtracks to the last `*`, no regex

use thiserror::Error;

/// Longest pattern accepted.
pub const MAX_PATTERN_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("pattern longer than {} characters", MAX_PATTERN_LEN)]
    TooLong,

    #[error("pattern contains whitespace")]
    Whitespace,
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if pattern.chars().count() > MAX_PATTERN_LEN {
            return Err(PatternError::TooLong);
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(PatternError::Whitespace);
        }

        let tokens = pattern
            .chars()
            .map(|c| match c {
                '*' => Token::AnyRun,
                '?' => Token::AnyOne,
                c => Token::Literal(c),
            })
            .collect();

        Ok(Self {
            source: pattern.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the whole of `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<char> = path.chars().collect();
        let (mut p, mut t) = (0, 0);
        // Position of the last `*` and the path index it was tried against.
        let mut star: Option<(usize, usize)> = None;

        while p < path.len() {
            match self.tokens.get(t) {
                Some(Token::AnyRun) => {
                    star = Some((t, p));
                    t += 1;
                }
                Some(Token::AnyOne) => {
                    p += 1;
                    t += 1;
                }
                Some(Token::Literal(c)) if *c == path[p] => {
                    p += 1;
                    t += 1;
                }
                _ => match star {
                    Some((star_t, star_p)) => {
                        t = star_t + 1;
                        p = star_p + 1;
                        star = Some((star_t, star_p + 1));
                    }
                    None => return false,
                },
            }
        }

        self.tokens[t..].iter().all(|token| *token == Token::AnyRun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        PathPattern::parse(pattern).unwrap().matches(path)
    }

    #[test]
    fn test_prefix_star() {
        assert!(matches("/site*", "/site"));
        assert!(matches("/site*", "/site/v1.0.0/page"));
        assert!(matches("/site*", "/sitepage"));
        assert!(!matches("/site*", "/Site"));
        assert!(!matches("/site*", "/api/site"));
    }

    #[test]
    fn test_directory_star() {
        assert!(matches("/api/*", "/api/"));
        assert!(matches("/api/*", "/api/users/1"));
        assert!(!matches("/api/*", "/api"));
    }

    #[test]
    fn test_exact() {
        assert!(matches("/500.html", "/500.html"));
        assert!(!matches("/500.html", "/500.html/x"));
        assert!(!matches("/500.html", "/500.htm"));
    }

    #[test]
    fn test_catch_all() {
        assert!(matches("/*", "/"));
        assert!(matches("/*", "/foo/bar"));
        assert!(matches("*", ""));
    }

    #[test]
    fn test_question_mark_and_inner_star() {
        assert!(matches("/v?/*.js", "/v1/app.js"));
        assert!(!matches("/v?/*.js", "/v10/app.js"));
        assert!(matches("/*/images/*.png", "/a/b/images/c.png"));
        assert!(!matches("/*/images/*.png", "/a/b/images/c.jpg"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PathPattern::parse(""), Err(PatternError::Empty));
        assert_eq!(PathPattern::parse("/a b"), Err(PatternError::Whitespace));
        assert_eq!(
            PathPattern::parse(&"a".repeat(MAX_PATTERN_LEN + 1)),
            Err(PatternError::TooLong)
        );
    }
}
