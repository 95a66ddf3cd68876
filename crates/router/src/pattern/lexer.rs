//! A small lexer for one path segment or one domain string.
//!
//! Grammar of a placeholder, where everything but the name is optional:
//!
//! ```text
//! [prefix](:name | {name...})[@alias][(regex)][? | + | *][=default][suffix]
//! ```
//!
//! Inside braces the same modifiers may be written before the closing brace,
//! e.g. `{id?}` or `{id(\d+)=1}`.

use crate::RouterError;

/// Whether the lexed text is a path segment or a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Segment,
    Domain,
}

/// The quantifier written after a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantifier {
    #[default]
    One,
    /// `?`
    Optional,
    /// `+`
    OneOrMore,
    /// `*`
    ZeroOrMore,
}

impl Quantifier {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Self::Optional),
            '+' => Some(Self::OneOrMore),
            '*' => Some(Self::ZeroOrMore),
            _ => None,
        }
    }

    #[inline]
    pub fn is_optional(self) -> bool {
        matches!(self, Self::Optional | Self::ZeroOrMore)
    }

    #[inline]
    pub fn is_repeat(self) -> bool {
        matches!(self, Self::OneOrMore | Self::ZeroOrMore)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "",
            Self::Optional => "?",
            Self::OneOrMore => "+",
            Self::ZeroOrMore => "*",
        }
    }
}

/// Raw pieces of a placeholder before rules and defaults are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Placeholder {
    pub prefix: String,
    pub name: String,
    pub alias: Option<String>,
    pub regex: Option<String>,
    pub quantifier: Option<Quantifier>,
    pub default: Option<String>,
    pub suffix: String,
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Finds the byte offset of the first placeholder marker, if any.
fn find_marker(src: &str) -> Option<usize> {
    let mut chars = src.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '{' => return Some(idx),
            ':' if chars.peek().is_some_and(|(_, next)| is_ident_start(*next)) => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Lexes `src`, returning `None` when it holds no placeholder at all.
pub fn lex(src: &str, kind: SourceKind) -> Result<Option<Placeholder>, RouterError> {
    let Some(marker) = find_marker(src) else {
        return Ok(None);
    };

    let mut placeholder = Placeholder { prefix: src[..marker].to_owned(), ..Placeholder::default() };
    let mut cursor = Cursor::new(src, marker);

    if cursor.eat('{') {
        placeholder.name = read_name(&mut cursor, src)?;
        read_modifiers(&mut cursor, &mut placeholder, src, |c| c == '}')?;
        if !cursor.eat('}') {
            return Err(RouterError::configuration(format!("unclosed placeholder in `{src}`")));
        }
    } else {
        cursor.bump();
        placeholder.name = read_name(&mut cursor, src)?;
    }

    let default_stop: fn(char) -> bool = match kind {
        SourceKind::Segment => |_| false,
        SourceKind::Domain => |c| c == '.',
    };
    read_modifiers(&mut cursor, &mut placeholder, src, default_stop)?;
    placeholder.suffix = cursor.rest().to_owned();

    Ok(Some(placeholder))
}

fn read_name(cursor: &mut Cursor, src: &str) -> Result<String, RouterError> {
    match cursor.peek() {
        Some(c) if is_ident_start(c) => Ok(cursor.eat_while(is_ident).to_owned()),
        _ => Err(RouterError::configuration(format!("placeholder without a valid name in `{src}`"))),
    }
}

/// Reads `@alias`, `(regex)`, the quantifier and `=default`, filling only unset fields.
fn read_modifiers(
    cursor: &mut Cursor,
    placeholder: &mut Placeholder,
    src: &str,
    default_stop: impl Fn(char) -> bool,
) -> Result<(), RouterError> {
    if placeholder.alias.is_none() && cursor.eat('@') {
        let alias = cursor.eat_while(is_ident);
        if alias.is_empty() {
            return Err(RouterError::configuration(format!("empty binding alias in `{src}`")));
        }
        placeholder.alias = Some(alias.to_owned());
    }

    if placeholder.regex.is_none() && cursor.peek() == Some('(') {
        placeholder.regex = Some(read_group(cursor, src)?);
    }

    if placeholder.quantifier.is_none()
        && let Some(quantifier) = cursor.peek().and_then(Quantifier::from_char)
    {
        cursor.bump();
        placeholder.quantifier = Some(quantifier);
    }

    if placeholder.default.is_none() && cursor.eat('=') {
        placeholder.default = Some(cursor.eat_while(|c| !default_stop(c)).to_owned());
    }

    Ok(())
}

/// Reads a balanced `( ... )` group and returns its inner text.
///
/// Escaped characters and parentheses inside character classes do not count toward nesting.
fn read_group(cursor: &mut Cursor, src: &str) -> Result<String, RouterError> {
    cursor.bump();
    let start = cursor.pos;
    let mut depth = 1usize;
    let mut in_class = false;

    while let Some(c) = cursor.bump() {
        match c {
            '\\' => {
                cursor.bump();
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    return Ok(src[start..cursor.pos - 1].to_owned());
                }
            }
            _ => {}
        }
    }

    Err(RouterError::configuration(format!("unbalanced regex group in `{src}`")))
}
