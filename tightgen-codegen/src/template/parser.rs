//! Template parser.
//!
//! Builds a [`Template`] from the token stream. Every structural problem is
//! reported here, before anything is rendered: unbalanced or unknown
//! blocks, malformed arguments, duplicate fragments, text outside a
//! fragment, includes of unknown fragments and include cycles.

use super::ast::{Branch, Comparison, Condition, Fragment, Node, Path, Span, Template};
use super::lexer::{Token, TokenKind, tokenize};
use crate::error::TemplateError;
use std::collections::HashMap;

/// Parses template source.
///
/// # Errors
/// Returns `TemplateError::Syntax` with the position of the offending tag.
pub fn parse(source: &str) -> Result<Template, TemplateError> {
    let tokens = tokenize(source)?;
    let fragments = Parser::new(tokens).fragments()?;
    check_includes(&fragments)?;
    tracing::debug!("Parsed template with {} fragments", fragments.len());
    Ok(Template::new(fragments))
}

/// Token that ended a node sequence.
enum Stop {
    Close { keyword: String, span: Span },
    Else { rest: String, span: Span },
    Eof,
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }

    fn fragments(mut self) -> Result<Vec<Fragment>, TemplateError> {
        let mut fragments: Vec<Fragment> = Vec::new();

        while let Some(token) = self.tokens.next() {
            let span = span_of(&token);
            match token.kind {
                TokenKind::Text(text) if text.trim().is_empty() => {}
                TokenKind::Open(body) => {
                    let (keyword, args) = split_word(&body);
                    if keyword != "fragment" {
                        return Err(syntax(span, format!("'{keyword}' block outside a fragment")));
                    }
                    let name = args.trim();
                    if !is_identifier(name) {
                        return Err(syntax(span, format!("invalid fragment name '{name}'")));
                    }
                    if fragments.iter().any(|f| f.name == name) {
                        return Err(syntax(span, format!("duplicate fragment '{name}'")));
                    }
                    let body = self.block_body(span, "fragment")?;
                    fragments.push(Fragment {
                        name: name.to_string(),
                        body,
                        span,
                    });
                }
                _ => return Err(syntax(span, "content outside a fragment")),
            }
        }

        Ok(fragments)
    }

    /// Parses nodes up to the closing tag of `keyword`.
    fn block_body(&mut self, open: Span, keyword: &str) -> Result<Vec<Node>, TemplateError> {
        let (body, stop) = self.nodes()?;
        match stop {
            Stop::Close { keyword: found, .. } if found == keyword => Ok(body),
            Stop::Close { keyword: found, span } => Err(syntax(
                span,
                format!("'/{found}' closes a '{keyword}' block opened at {open}"),
            )),
            Stop::Else { span, .. } => Err(syntax(span, "'else' outside an if block")),
            Stop::Eof => Err(syntax(open, format!("unterminated '{keyword}' block"))),
        }
    }

    fn nodes(&mut self) -> Result<(Vec<Node>, Stop), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.next() {
            let span = span_of(&token);
            match token.kind {
                TokenKind::Text(text) => nodes.push(Node::Text(text)),
                TokenKind::Expr(expr) => {
                    let path = Path::parse(&expr)
                        .ok_or_else(|| syntax(span, format!("invalid variable path '{expr}'")))?;
                    nodes.push(Node::Variable { path, span });
                }
                TokenKind::Include(name) => {
                    if !is_identifier(&name) {
                        return Err(syntax(span, format!("invalid fragment name '{name}'")));
                    }
                    nodes.push(Node::Include { name, span });
                }
                TokenKind::Open(body) => {
                    let (keyword, args) = split_word(&body);
                    let node = match keyword {
                        "each" => self.each(args, span)?,
                        "if" => self.conditional(args, span)?,
                        "fragment" => return Err(syntax(span, "fragments cannot be nested")),
                        other => return Err(syntax(span, format!("unknown block '{other}'"))),
                    };
                    nodes.push(node);
                }
                TokenKind::Close(keyword) => return Ok((nodes, Stop::Close { keyword, span })),
                TokenKind::Else(rest) => return Ok((nodes, Stop::Else { rest, span })),
            }
        }

        Ok((nodes, Stop::Eof))
    }

    fn each(&mut self, args: &str, span: Span) -> Result<Node, TemplateError> {
        let (path, binding, separator) = parse_each_args(args).map_err(|m| syntax(span, m))?;
        let body = self.block_body(span, "each")?;
        Ok(Node::Each {
            path,
            binding,
            separator,
            body,
            span,
        })
    }

    fn conditional(&mut self, args: &str, span: Span) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut condition = parse_condition(args, span)?;

        loop {
            let (body, stop) = self.nodes()?;
            branches.push(Branch { condition, body });
            match stop {
                Stop::Close { keyword, .. } if keyword == "if" => {
                    return Ok(Node::If {
                        branches,
                        otherwise: None,
                    });
                }
                Stop::Else { rest, span: else_span } => {
                    if rest.is_empty() {
                        let otherwise = self.block_body(span, "if")?;
                        return Ok(Node::If {
                            branches,
                            otherwise: Some(otherwise),
                        });
                    }
                    let args = rest.strip_prefix("if ").ok_or_else(|| {
                        syntax(else_span, "expected 'else' or 'else if <condition>'")
                    })?;
                    condition = parse_condition(args, else_span)?;
                }
                Stop::Close { keyword, span: close } => {
                    return Err(syntax(
                        close,
                        format!("'/{keyword}' closes an 'if' block opened at {span}"),
                    ));
                }
                Stop::Eof => return Err(syntax(span, "unterminated 'if' block")),
            }
        }
    }
}

/// Parses `path as name [sep="text"]`.
fn parse_each_args(args: &str) -> Result<(Path, String, Option<String>), String> {
    let (path_text, rest) = split_word(args);
    let path = Path::parse(path_text).ok_or_else(|| format!("invalid list path '{path_text}'"))?;

    let (keyword, rest) = split_word(rest);
    if keyword != "as" {
        return Err("expected 'each <path> as <name>'".to_string());
    }

    let (binding, rest) = split_word(rest);
    if !is_identifier(binding) {
        return Err(format!("invalid loop variable '{binding}'"));
    }
    if binding == "loop" {
        return Err("'loop' is reserved for iteration state".to_string());
    }

    let rest = rest.trim();
    let separator = if rest.is_empty() {
        None
    } else {
        let literal = rest
            .strip_prefix("sep=")
            .ok_or_else(|| format!("unexpected '{rest}' in each block"))?;
        let (value, tail) = parse_string_literal(literal)?;
        if !tail.trim().is_empty() {
            return Err(format!("unexpected '{}' after separator", tail.trim()));
        }
        Some(value)
    };

    Ok((path, binding.to_string(), separator))
}

/// Parses `[not] path [(==|!=) "literal"]`.
fn parse_condition(args: &str, span: Span) -> Result<Condition, TemplateError> {
    let mut rest = args.trim();
    let negated = match rest.strip_prefix("not ") {
        Some(after) => {
            rest = after;
            true
        }
        None => false,
    };

    let (path_text, rest) = split_word(rest);
    let path = Path::parse(path_text)
        .ok_or_else(|| syntax(span, format!("invalid condition path '{path_text}'")))?;

    let rest = rest.trim();
    let comparison = if rest.is_empty() {
        None
    } else {
        let (op, literal) = if let Some(literal) = rest.strip_prefix("==") {
            (Comparison::Equal, literal)
        } else if let Some(literal) = rest.strip_prefix("!=") {
            (Comparison::NotEqual, literal)
        } else {
            return Err(syntax(span, format!("expected '==' or '!=', found '{rest}'")));
        };
        let (value, tail) =
            parse_string_literal(literal.trim_start()).map_err(|m| syntax(span, m))?;
        if !tail.trim().is_empty() {
            return Err(syntax(span, format!("unexpected '{}' in condition", tail.trim())));
        }
        Some((op, value))
    };

    Ok(Condition {
        negated,
        path,
        comparison,
        span,
    })
}

/// Parses a double-quoted literal with `\n`, `\t`, `\"` and `\\` escapes,
/// returning the value and the remaining input.
fn parse_string_literal(input: &str) -> Result<(String, &str), String> {
    let mut chars = input.char_indices();
    if !matches!(chars.next(), Some((_, '"'))) {
        return Err("expected a string literal".to_string());
    }

    let mut value = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &input[i + 1..])),
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped @ ('"' | '\\'))) => value.push(escaped),
                _ => return Err("invalid escape in string literal".to_string()),
            },
            c => value.push(c),
        }
    }
    Err("unterminated string literal".to_string())
}

/// Checks that every include names a fragment and that includes form no
/// cycle.
fn check_includes(fragments: &[Fragment]) -> Result<(), TemplateError> {
    let mut edges: HashMap<&str, Vec<(&str, Span)>> = HashMap::new();
    for fragment in fragments {
        let mut includes = Vec::new();
        collect_includes(&fragment.body, &mut includes);
        for (name, span) in &includes {
            if !fragments.iter().any(|f| f.name == *name) {
                return Err(syntax(*span, format!("include of unknown fragment '{name}'")));
            }
        }
        edges.insert(fragment.name.as_str(), includes);
    }

    let mut done = Vec::new();
    for fragment in fragments {
        let mut path = Vec::new();
        visit(fragment.name.as_str(), &edges, &mut path, &mut done)?;
    }
    Ok(())
}

fn visit<'a>(
    name: &'a str,
    edges: &HashMap<&'a str, Vec<(&'a str, Span)>>,
    path: &mut Vec<&'a str>,
    done: &mut Vec<&'a str>,
) -> Result<(), TemplateError> {
    if done.contains(&name) {
        return Ok(());
    }
    path.push(name);
    for (target, span) in edges.get(name).map(Vec::as_slice).unwrap_or_default() {
        if path.contains(target) {
            let cycle = path
                .iter()
                .skip_while(|n| *n != target)
                .chain(std::iter::once(target))
                .copied()
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(syntax(*span, format!("include cycle {cycle}")));
        }
        visit(*target, edges, path, done)?;
    }
    path.pop();
    done.push(name);
    Ok(())
}

fn collect_includes<'a>(nodes: &'a [Node], out: &mut Vec<(&'a str, Span)>) {
    for node in nodes {
        match node {
            Node::Include { name, span } => out.push((name.as_str(), *span)),
            Node::Each { body, .. } => collect_includes(body, out),
            Node::If {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    collect_includes(&branch.body, out);
                }
                if let Some(body) = otherwise {
                    collect_includes(body, out);
                }
            }
            Node::Text(_) | Node::Variable { .. } => {}
        }
    }
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn span_of(token: &Token) -> Span {
    Span {
        line: token.line,
        column: token.column,
    }
}

fn syntax(span: Span, message: impl Into<String>) -> TemplateError {
    TemplateError::syntax(span.line, span.column, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_error(source: &str) -> (usize, usize, String) {
        match parse(source) {
            Err(TemplateError::Syntax {
                line,
                column,
                message,
            }) => (line, column, message),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_fragments() {
        let template = parse(
            concat!(
                "{{#fragment a}}\nhello {{name}}\n{{/fragment}}\n\n",
                "{{#fragment b}}\nbye\n{{/fragment}}\n"
            ),
        )
        .expect("Failed to parse");
        let names: Vec<_> = template.fragments().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let a = template.fragment("a").expect("a missing");
        assert_eq!(a.body.len(), 3);
        assert!(matches!(&a.body[1], Node::Variable { path, .. } if path.to_string() == "name"));
    }

    #[test]
    fn test_parse_each_with_separator() {
        let template =
            parse(r#"{{#fragment f}}{{#each xs as x sep=", "}}{{x}}{{/each}}{{/fragment}}"#)
                .expect("Failed to parse");
        let f = template.fragment("f").expect("f missing");
        match &f.body[0] {
            Node::Each {
                path,
                binding,
                separator,
                ..
            } => {
                assert_eq!(path.to_string(), "xs");
                assert_eq!(binding, "x");
                assert_eq!(separator.as_deref(), Some(", "));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_chain() {
        let source =
            r#"{{#fragment f}}{{#if not a}}1{{else if b == "x"}}2{{else}}3{{/if}}{{/fragment}}"#;
        let template = parse(source).expect("Failed to parse");
        match &template.fragment("f").expect("f missing").body[0] {
            Node::If {
                branches,
                otherwise,
            } => {
                assert_eq!(branches.len(), 2);
                assert!(branches[0].condition.negated);
                assert_eq!(
                    branches[1].condition.comparison,
                    Some((Comparison::Equal, "x".to_string()))
                );
                assert_eq!(otherwise.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_block_points_at_opening_tag() {
        let (line, column, message) =
            syntax_error("{{#fragment f}}\n  {{#each xs as x}}\n{{/fragment}}");
        assert_eq!((line, column), (3, 1));
        assert!(message.contains("closes a 'each' block"), "{message}");

        let (line, column, _) = syntax_error("{{#fragment f}}\nx\n");
        assert_eq!((line, column), (1, 1));
    }

    #[test]
    fn test_text_outside_fragment() {
        let (_, _, message) = syntax_error("stray\n{{#fragment f}}x{{/fragment}}");
        assert!(message.contains("outside a fragment"));
    }

    #[test]
    fn test_duplicate_fragment() {
        let (_, _, message) =
            syntax_error("{{#fragment f}}x{{/fragment}}{{#fragment f}}y{{/fragment}}");
        assert!(message.contains("duplicate fragment 'f'"));
    }

    #[test]
    fn test_unknown_block() {
        let (_, _, message) = syntax_error("{{#fragment f}}{{#with x}}{{/with}}{{/fragment}}");
        assert!(message.contains("unknown block 'with'"));
    }

    #[test]
    fn test_malformed_each() {
        let (_, _, message) = syntax_error("{{#fragment f}}{{#each xs}}{{/each}}{{/fragment}}");
        assert!(message.contains("as <name>"));
        let (_, _, message) =
            syntax_error("{{#fragment f}}{{#each xs as loop}}{{/each}}{{/fragment}}");
        assert!(message.contains("reserved"));
    }

    #[test]
    fn test_unknown_include() {
        let (_, _, message) = syntax_error("{{#fragment f}}{{> g}}{{/fragment}}");
        assert!(message.contains("unknown fragment 'g'"));
    }

    #[test]
    fn test_include_cycle() {
        let source = concat!(
            "{{#fragment a}}{{> b}}{{/fragment}}",
            "{{#fragment b}}{{> c}}{{/fragment}}",
            "{{#fragment c}}{{> a}}{{/fragment}}"
        );
        let (_, _, message) = syntax_error(source);
        assert!(message.contains("include cycle"), "{message}");
        assert!(message.contains("a -> b -> c -> a"), "{message}");
    }

    #[test]
    fn test_self_include() {
        let (_, _, message) = syntax_error("{{#fragment a}}{{> a}}{{/fragment}}");
        assert!(message.contains("a -> a"), "{message}");
    }

    #[test]
    fn test_else_outside_if() {
        let (_, _, message) = syntax_error("{{#fragment f}}{{else}}{{/fragment}}");
        assert!(message.contains("'else' outside"));
    }

    #[test]
    fn test_invalid_comparison() {
        let (_, _, message) = syntax_error(r#"{{#fragment f}}{{#if a < "b"}}{{/if}}{{/fragment}}"#);
        assert!(message.contains("expected '==' or '!='"));
    }
}
