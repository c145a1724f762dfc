//! Parser for the line grammar: a recursive descent over the token
//! stream into a fragment tree. Quoted property values re-enter the whole
//! grammar, so parsed strings nest.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::error::MarkupError;
use crate::lexer::{lex, Token};

/// A parsed line template, or the contents of a double-quoted string
/// inside one.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ParsedString {
    pub(crate) fragments: Vec<Fragment>,
}

/// One piece of a parsed string. Special pieces (escapes, markup,
/// substitutions) render specially; the rest is literal text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fragment {
    Escaped(char),
    Markup(MarkupTag),
    /// A substitution token; carries the digits between the braces.
    Subst(String),
    Text(String),
}

/// A markup tag: either a format function (select/plural/ordinal) or an
/// attribute tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct MarkupTag {
    /// Leading slash: a closing tag, or the close-all tag when `name` is
    /// absent.
    pub(crate) opening_slash: bool,
    /// Absent only for the close-all tag `[/]` and the degenerate `[]`.
    pub(crate) name: Option<String>,
    pub(crate) props: Vec<Prop>,
    /// Trailing slash: a self-closing tag.
    pub(crate) closing_slash: bool,
}

/// A `key="value"` or `key={N}` property.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Prop {
    pub(crate) key: String,
    pub(crate) value: PropValue,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PropValue {
    /// A quoted value, which may itself contain substitutions and markup.
    String(ParsedString),
    /// An unquoted substitution token, e.g. `value={0}`.
    Subst(String),
}

type Tokens = Peekable<IntoIter<Token>>;

/// Parses a line template.
pub(crate) fn parse(input: &str) -> Result<ParsedString, MarkupError> {
    let mut tokens = lex(input)?.into_iter().peekable();
    let parsed = parse_string(&mut tokens, None)?;
    match tokens.next() {
        None => Ok(parsed),
        Some(tok) => Err(MarkupError::MalformedText(format!(
            "unexpected trailing {tok:?}"
        ))),
    }
}

/// Parses fragments until `until` (or the end of input when `None`).
fn parse_string(tokens: &mut Tokens, until: Option<Token>) -> Result<ParsedString, MarkupError> {
    let mut fragments = Vec::new();
    loop {
        let terminates = match (tokens.peek(), until.as_ref()) {
            (None, Some(_)) => {
                return Err(MarkupError::MalformedText(
                    "unterminated string".to_string(),
                ))
            }
            (None, None) => break,
            (Some(tok), Some(term)) => tok == term,
            (Some(_), None) => false,
        };
        if terminates {
            tokens.next();
            break;
        }
        match tokens.next().expect("peeked") {
            Token::Escaped(c) => fragments.push(Fragment::Escaped(c)),
            Token::Text(s) => fragments.push(Fragment::Text(s)),
            Token::SubstStart => fragments.push(Fragment::Subst(parse_subst(tokens)?)),
            Token::MarkupStart => fragments.push(Fragment::Markup(parse_markup(tokens)?)),
            tok => {
                return Err(MarkupError::MalformedText(format!(
                    "unexpected {tok:?}"
                )))
            }
        }
    }
    Ok(ParsedString { fragments })
}

/// Parses the inside of a substitution after SubstStart.
fn parse_subst(tokens: &mut Tokens) -> Result<String, MarkupError> {
    let index = match tokens.next() {
        Some(Token::Index(digits)) => digits,
        other => {
            return Err(MarkupError::MalformedText(format!(
                "expected substitution index, found {other:?}"
            )))
        }
    };
    match tokens.next() {
        Some(Token::SubstEnd) => Ok(index),
        other => Err(MarkupError::MalformedText(format!(
            "expected '}}', found {other:?}"
        ))),
    }
}

/// Parses the inside of a markup tag after MarkupStart.
fn parse_markup(tokens: &mut Tokens) -> Result<MarkupTag, MarkupError> {
    let mut tag = MarkupTag::default();
    if matches!(tokens.peek(), Some(Token::Slash)) {
        tokens.next();
        tag.opening_slash = true;
    }
    if let Some(Token::Ident(_)) = tokens.peek() {
        match tokens.next() {
            Some(Token::Ident(name)) => tag.name = Some(name),
            _ => unreachable!(),
        }
    }
    while let Some(Token::Ident(_)) = tokens.peek() {
        let key = match tokens.next() {
            Some(Token::Ident(key)) => key,
            _ => unreachable!(),
        };
        match tokens.next() {
            Some(Token::Equals) => {}
            other => {
                return Err(MarkupError::MalformedText(format!(
                    "expected '=' after property {key:?}, found {other:?}"
                )))
            }
        }
        let value = match tokens.next() {
            Some(Token::StringStart) => {
                PropValue::String(parse_string(tokens, Some(Token::StringEnd))?)
            }
            Some(Token::SubstStart) => PropValue::Subst(parse_subst(tokens)?),
            other => {
                return Err(MarkupError::MalformedText(format!(
                    "expected property value for {key:?}, found {other:?}"
                )))
            }
        };
        tag.props.push(Prop { key, value });
    }
    if matches!(tokens.peek(), Some(Token::Slash)) {
        tokens.next();
        tag.closing_slash = true;
    }
    match tokens.next() {
        Some(Token::MarkupEnd) => Ok(tag),
        other => Err(MarkupError::MalformedText(format!(
            "expected ']', found {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_and_subst() {
        let parsed = parse("Hello, {0}!").unwrap();
        assert_eq!(
            parsed.fragments,
            vec![
                Fragment::Text("Hello, ".to_string()),
                Fragment::Subst("0".to_string()),
                Fragment::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_open_and_close_tags() {
        let parsed = parse("[b]x[/b][/]").unwrap();
        assert_eq!(parsed.fragments.len(), 4);
        match &parsed.fragments[0] {
            Fragment::Markup(tag) => {
                assert!(!tag.opening_slash);
                assert_eq!(tag.name.as_deref(), Some("b"));
                assert!(!tag.closing_slash);
            }
            other => panic!("expected markup, got {other:?}"),
        }
        match &parsed.fragments[2] {
            Fragment::Markup(tag) => {
                assert!(tag.opening_slash);
                assert_eq!(tag.name.as_deref(), Some("b"));
            }
            other => panic!("expected markup, got {other:?}"),
        }
        match &parsed.fragments[3] {
            Fragment::Markup(tag) => {
                assert!(tag.opening_slash);
                assert_eq!(tag.name, None);
            }
            other => panic!("expected markup, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_format_function() {
        let parsed = parse(r#"[plural value={0} one="% apple" other="% apples"]"#).unwrap();
        let tag = match &parsed.fragments[0] {
            Fragment::Markup(tag) => tag,
            other => panic!("expected markup, got {other:?}"),
        };
        assert_eq!(tag.name.as_deref(), Some("plural"));
        assert_eq!(tag.props.len(), 3);
        assert_eq!(tag.props[0].key, "value");
        assert_eq!(tag.props[0].value, PropValue::Subst("0".to_string()));
        assert_eq!(tag.props[1].key, "one");
        match &tag.props[1].value {
            PropValue::String(s) => {
                assert_eq!(s.fragments[0], Fragment::Text("%".to_string()));
                assert_eq!(s.fragments[1], Fragment::Text(" apple".to_string()));
            }
            other => panic!("expected string prop, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_markup_in_prop_value() {
        let parsed = parse(r#"[a hint="see [b]this[/b]"]"#).unwrap();
        let tag = match &parsed.fragments[0] {
            Fragment::Markup(tag) => tag,
            other => panic!("expected markup, got {other:?}"),
        };
        match &tag.props[0].value {
            PropValue::String(inner) => {
                assert!(inner
                    .fragments
                    .iter()
                    .any(|f| matches!(f, Fragment::Markup(_))));
            }
            other => panic!("expected string prop, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_prop_value_is_malformed() {
        assert!(matches!(
            parse("[a key=]"),
            Err(MarkupError::MalformedText(_))
        ));
    }
}
