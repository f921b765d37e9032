//! Literal and constructor-call expressions of Python declarations
//!
//! Declarations only use a small expression subset: literals, lists and
//! tuples, names of module constants, calls with positional and keyword
//! arguments, unary minus and `+` between lists. Anything else is rejected
//! with the offending source text.

use ast_grep_core::source::StrDoc;
use ast_grep_core::Node;
use ast_grep_language::Python;

pub type PyNode<'r> = Node<'r, StrDoc<Python>>;

#[derive(Debug, Clone, PartialEq)]
pub enum PyExpr {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<PyExpr>),
    Tuple(Vec<PyExpr>),
    /// Bare or dotted name; dotted names keep only the last segment
    Name(String),
    Call {
        func: String,
        args: Vec<PyExpr>,
        kwargs: Vec<(String, PyExpr)>,
    },
    /// `left + right`
    Add(Box<PyExpr>, Box<PyExpr>),
}

impl PyExpr {
    /// Python truthiness for flags such as `pure_python = 1`
    pub fn truthy(&self) -> bool {
        match self {
            PyExpr::None => false,
            PyExpr::Bool(b) => *b,
            PyExpr::Int(i) => *i != 0,
            PyExpr::Float(f) => *f != 0.0,
            PyExpr::Str(s) => !s.is_empty(),
            PyExpr::List(items) | PyExpr::Tuple(items) => !items.is_empty(),
            PyExpr::Name(_) | PyExpr::Call { .. } | PyExpr::Add(..) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PyExpr::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a list or tuple
    pub fn items(&self) -> Option<&[PyExpr]> {
        match self {
            PyExpr::List(items) | PyExpr::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

fn last_segment(text: &str) -> String {
    text.rsplit('.').next().unwrap_or(text).trim().to_string()
}

/// Named nodes that carry syntax, not comments or `\` continuations
pub fn is_syntax(node: &PyNode<'_>) -> bool {
    node.is_named() && !matches!(&*node.kind(), "comment" | "line_continuation")
}

fn named_children<'a, 'r>(node: &'a PyNode<'r>) -> impl Iterator<Item = PyNode<'r>> + 'a {
    node.children().filter(is_syntax)
}

/// Convert a parsed expression node
pub fn parse_node(node: &PyNode<'_>) -> Result<PyExpr, String> {
    let text = node.text();
    match &*node.kind() {
        "none" => Ok(PyExpr::None),
        "true" => Ok(PyExpr::Bool(true)),
        "false" => Ok(PyExpr::Bool(false)),
        "integer" => parse_int(&text).ok_or_else(|| format!("invalid integer '{}'", text)),
        "float" => text
            .replace('_', "")
            .parse::<f64>()
            .map(PyExpr::Float)
            .map_err(|_| format!("invalid float '{}'", text)),
        "string" => parse_string(&text).map(PyExpr::Str),
        "concatenated_string" => {
            let mut joined = String::new();
            for part in named_children(node) {
                joined.push_str(&parse_string(&part.text())?);
            }
            Ok(PyExpr::Str(joined))
        }
        "identifier" => Ok(PyExpr::Name(text.to_string())),
        "attribute" => Ok(PyExpr::Name(last_segment(&text))),
        "list" => Ok(PyExpr::List(parse_all(node)?)),
        "tuple" => Ok(PyExpr::Tuple(parse_all(node)?)),
        "parenthesized_expression" => match named_children(node).next() {
            Some(inner) => parse_node(&inner),
            None => Ok(PyExpr::Tuple(Vec::new())),
        },
        "unary_operator" => {
            let operand = node
                .field("argument")
                .ok_or_else(|| format!("malformed expression '{}'", text))?;
            match (text.trim_start().chars().next(), parse_node(&operand)?) {
                (Some('-'), PyExpr::Int(i)) => Ok(PyExpr::Int(-i)),
                (Some('-'), PyExpr::Float(f)) => Ok(PyExpr::Float(-f)),
                (Some('+'), value @ (PyExpr::Int(_) | PyExpr::Float(_))) => Ok(value),
                _ => Err(format!("unsupported expression '{}'", text)),
            }
        }
        "binary_operator" => {
            let operator = node.field("operator").map(|op| op.text().to_string());
            let (Some(left), Some(right)) = (node.field("left"), node.field("right")) else {
                return Err(format!("malformed expression '{}'", text));
            };
            if operator.as_deref() != Some("+") {
                return Err(format!("unsupported operator in '{}'", text));
            }
            Ok(PyExpr::Add(
                Box::new(parse_node(&left)?),
                Box::new(parse_node(&right)?),
            ))
        }
        "call" => {
            let func = node
                .field("function")
                .map(|f| last_segment(&f.text()))
                .ok_or_else(|| format!("malformed call '{}'", text))?;
            let mut args = Vec::new();
            let mut kwargs = Vec::new();
            if let Some(arguments) = node.field("arguments") {
                for arg in named_children(&arguments) {
                    if arg.kind() == "keyword_argument" {
                        let (Some(name), Some(value)) = (arg.field("name"), arg.field("value"))
                        else {
                            return Err(format!("malformed keyword argument '{}'", arg.text()));
                        };
                        kwargs.push((name.text().to_string(), parse_node(&value)?));
                    } else {
                        args.push(parse_node(&arg)?);
                    }
                }
            }
            Ok(PyExpr::Call { func, args, kwargs })
        }
        _ => Err(format!("unsupported expression '{}'", text)),
    }
}

fn parse_all(node: &PyNode<'_>) -> Result<Vec<PyExpr>, String> {
    named_children(node).map(|child| parse_node(&child)).collect()
}

fn parse_int(text: &str) -> Option<PyExpr> {
    let digits = text.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    let value = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        lower.trim_end_matches('l').parse().ok()?
    };
    Some(PyExpr::Int(value))
}

/// Decode one string literal, including its prefix and quotes
pub fn parse_string(literal: &str) -> Result<String, String> {
    let body_start = literal
        .find(|c| c == '"' || c == '\'')
        .ok_or_else(|| format!("invalid string literal {}", literal))?;
    let prefix = literal[..body_start].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return Err(format!("unsupported string literal {}", literal));
    }
    let raw = prefix.contains('r');
    let quoted = &literal[body_start..];
    let inner = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find_map(|q| {
            quoted
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
                .filter(|_| quoted.len() >= 2 * q.len())
        })
        .ok_or_else(|| format!("invalid string literal {}", literal))?;
    if raw {
        return Ok(inner.to_string());
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // Line continuation inside the literal
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Ok(out)
}

/// Strip docstring indentation the way Python's `inspect.cleandoc` does
pub fn clean_docstring(doc: &str) -> String {
    let expanded = doc.replace('\t', "        ");
    let mut lines = expanded.lines();
    let first = lines.next().unwrap_or("").trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = vec![first];
    out.extend(rest.iter().map(|l| {
        if l.len() >= indent {
            l[indent..].trim_end().to_string()
        } else {
            l.trim().to_string()
        }
    }));
    while out.first().is_some_and(String::is_empty) {
        out.remove(0);
    }
    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use crate::expr::*;
    use ast_grep_core::AstGrep;

    fn parse(source: &str) -> PyExpr {
        let sg = AstGrep::new(format!("value = {}\n", source), Python);
        let root = sg.root();
        let Some(assignment) = root.find("value = $V") else {
            panic!("assignment should parse");
        };
        let Some(right) = assignment.get_node().field("right") else {
            panic!("assignment should have a value");
        };
        match parse_node(&right) {
            Ok(expr) => expr,
            Err(e) => panic!("{}: {}", source, e),
        }
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("42"), PyExpr::Int(42));
        assert_eq!(parse("-3"), PyExpr::Int(-3));
        assert_eq!(parse("2.5"), PyExpr::Float(2.5));
        assert_eq!(parse("True"), PyExpr::Bool(true));
        assert_eq!(parse("None"), PyExpr::None);
        assert_eq!(parse("'dense'"), PyExpr::Str("dense".to_string()));
        assert_eq!(parse("\"a\" \"b\""), PyExpr::Str("ab".to_string()));
    }

    #[test]
    fn test_constructor_call() {
        assert_eq!(
            parse("Int('ntimes', range=(0, 10), default=1)"),
            PyExpr::Call {
                func: "Int".to_string(),
                args: vec![PyExpr::Str("ntimes".to_string())],
                kwargs: vec![
                    (
                        "range".to_string(),
                        PyExpr::Tuple(vec![PyExpr::Int(0), PyExpr::Int(10)])
                    ),
                    ("default".to_string(), PyExpr::Int(1)),
                ],
            }
        );
    }

    #[test]
    fn test_lists_names_and_addition() {
        assert_eq!(
            parse("ALL + [COMPLEX]"),
            PyExpr::Add(
                Box::new(PyExpr::Name("ALL".to_string())),
                Box::new(PyExpr::List(vec![PyExpr::Name("COMPLEX".to_string())]))
            )
        );
        assert_eq!(parse("args.Int"), PyExpr::Name("Int".to_string()));
    }

    #[test]
    fn test_line_continuations_are_skipped() {
        assert_eq!(
            parse("[1, \\\n     2]"),
            PyExpr::List(vec![PyExpr::Int(1), PyExpr::Int(2)])
        );
    }

    #[test]
    fn test_unsupported_expression_is_rejected() {
        let sg = AstGrep::new("value = lambda x: x\n", Python);
        let root = sg.root();
        let Some(assignment) = root.find("value = $V") else {
            panic!("assignment should parse");
        };
        let Some(right) = assignment.get_node().field("right") else {
            panic!("assignment should have a value");
        };
        assert!(parse_node(&right).is_err());
    }

    #[test]
    fn test_string_escapes_and_prefixes() {
        assert_eq!(parse_string(r#""a\tb""#), Ok("a\tb".to_string()));
        assert_eq!(parse_string(r#"r"a\tb""#), Ok("a\\tb".to_string()));
        assert_eq!(parse_string("'''x'''"), Ok("x".to_string()));
        assert!(parse_string("b'x'").is_err());
    }

    #[test]
    fn test_clean_docstring() {
        let doc = "Perform the AND operation.\n\n      +---+\n      | 0 |\n      +---+\n    ";
        assert_eq!(
            clean_docstring(doc),
            "Perform the AND operation.\n\n+---+\n| 0 |\n+---+"
        );
    }
}
