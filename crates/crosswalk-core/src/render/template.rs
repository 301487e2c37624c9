//! Text templates for Markdown reports.
//!
//! A small subset of Go's `text/template` syntax, enough for report layouts:
//!
//! - `{{ .field.path }}`, `{{ . }}`, `{{ $.root.field }}`
//! - `{{ range .list }}…{{ else }}…{{ end }}`
//! - `{{ if .value }}…{{ else }}…{{ end }}`
//! - `{{- … -}}` trim markers and `{{/* comments */}}`
//! - `{{ reindent .text 4 }}` (alias `newline_with_indent`)
//!
//! Templates are parsed once up front; rendering is fully buffered so a failing
//! execution never produces partial output.

use serde::Serialize;
use serde_json::Value as Data;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("{name}:{line}: {message}")]
    Parse {
        name: String,
        line: usize,
        message: String,
    },

    #[error("{name}: {message}")]
    Execute { name: String, message: String },
}

/// Replace every newline in `text` with a newline followed by `indent` spaces.
pub fn reindent(text: &str, indent: usize) -> String {
    text.replace('\n', &format!("\n{}", " ".repeat(indent)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Helper {
    Reindent,
}

impl Helper {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "reindent" | "newline_with_indent" => Some(Helper::Reindent),
            _ => None,
        }
    }

    fn arity(self) -> usize {
        match self {
            Helper::Reindent => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Field { from_root: bool, path: Vec<String> },
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Operand(Operand),
    Call { helper: Helper, args: Vec<Operand> },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Output { expr: Expr, line: usize },
    Range {
        expr: Expr,
        body: Vec<Node>,
        otherwise: Vec<Node>,
        line: usize,
    },
    If {
        expr: Expr,
        body: Vec<Node>,
        otherwise: Vec<Node>,
        line: usize,
    },
}

#[derive(Debug)]
enum Action {
    Expr(Expr),
    Range(Expr),
    If(Expr),
    Else,
    End,
}

#[derive(Debug)]
enum Token {
    Text(String),
    Action { action: Action, line: usize },
}

/// A parsed template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        let parser = Parser {
            name: name.to_string(),
        };
        let tokens = parser.lex(source)?;
        let mut iter = tokens.into_iter();
        let (nodes, terminator) = parser.parse_block(&mut iter)?;
        if let Some((kind, line)) = terminator {
            return Err(parser.error(line, format!("unexpected {{{{{kind}}}}}")));
        }
        Ok(Self {
            name: name.to_string(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against any serializable value.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String, TemplateError> {
        let data = serde_json::to_value(value).map_err(|e| self.exec_error(e.to_string()))?;
        let mut out = String::new();
        self.exec_nodes(&self.nodes, &data, &data, &mut out)?;
        Ok(out)
    }

    fn exec_nodes(
        &self,
        nodes: &[Node],
        dot: &Data,
        root: &Data,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output { expr, line } => {
                    let value = self.eval(expr, dot, root, *line)?;
                    out.push_str(&display(&value));
                }
                Node::If {
                    expr,
                    body,
                    otherwise,
                    line,
                } => {
                    let value = self.eval(expr, dot, root, *line)?;
                    let branch = if truthy(&value) { body } else { otherwise };
                    self.exec_nodes(branch, dot, root, out)?;
                }
                Node::Range {
                    expr,
                    body,
                    otherwise,
                    line,
                } => {
                    let value = self.eval(expr, dot, root, *line)?;
                    let items: Vec<&Data> = match &value {
                        Data::Null => Vec::new(),
                        Data::Array(items) => items.iter().collect(),
                        Data::Object(map) => map.values().collect(),
                        other => {
                            return Err(self.exec_error(format!(
                                "line {line}: range can't iterate over {}",
                                kind(other)
                            )))
                        }
                    };
                    if items.is_empty() {
                        self.exec_nodes(otherwise, dot, root, out)?;
                    }
                    for item in items {
                        self.exec_nodes(body, item, root, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, dot: &Data, root: &Data, line: usize) -> Result<Data, TemplateError> {
        match expr {
            Expr::Operand(op) => self.operand(op, dot, root, line),
            Expr::Call { helper, args } => {
                let values = args
                    .iter()
                    .map(|a| self.operand(a, dot, root, line))
                    .collect::<Result<Vec<_>, _>>()?;
                match helper {
                    Helper::Reindent => {
                        let indent = values[1]
                            .as_u64()
                            .and_then(|n| usize::try_from(n).ok())
                            .ok_or_else(|| {
                                self.exec_error(format!(
                                    "line {line}: reindent expects a non-negative indent, got {}",
                                    display(&values[1])
                                ))
                            })?;
                        Ok(Data::String(reindent(&display(&values[0]), indent)))
                    }
                }
            }
        }
    }

    fn operand(&self, op: &Operand, dot: &Data, root: &Data, line: usize) -> Result<Data, TemplateError> {
        match op {
            Operand::Int(n) => Ok(Data::from(*n)),
            Operand::Str(s) => Ok(Data::String(s.clone())),
            Operand::Field { from_root, path } => {
                let mut current = if *from_root { root } else { dot };
                for segment in path {
                    current = match current {
                        Data::Object(map) => map.get(segment).unwrap_or(&Data::Null),
                        Data::Null => &Data::Null,
                        other => {
                            return Err(self.exec_error(format!(
                                "line {line}: can't evaluate field {segment} in {}",
                                kind(other)
                            )))
                        }
                    };
                }
                Ok(current.clone())
            }
        }
    }

    fn exec_error(&self, message: String) -> TemplateError {
        TemplateError::Execute {
            name: self.name.clone(),
            message,
        }
    }
}

/// Byte offset of the `}}` that closes an action body. A `}}` inside a
/// comment or a quoted string does not close the action.
fn find_action_close(body: &str) -> Option<usize> {
    let head = body.strip_prefix('-').unwrap_or(body).trim_start();
    if let Some(comment) = head.strip_prefix("/*") {
        let end = comment.find("*/")? + 2;
        let after = comment[end..].trim_start();
        let after = after.strip_prefix('-').unwrap_or(after);
        return after.starts_with("}}").then_some(body.len() - after.len());
    }

    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    // unterminated; let the word splitter report it
                    return body.find("}}");
                }
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn display(value: &Data) -> String {
    match value {
        Data::Null => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => b.to_string(),
        Data::Number(n) => n.to_string(),
        Data::Array(_) | Data::Object(_) => value.to_string(),
    }
}

fn truthy(value: &Data) -> bool {
    match value {
        Data::Null => false,
        Data::Bool(b) => *b,
        Data::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Data::String(s) => !s.is_empty(),
        Data::Array(items) => !items.is_empty(),
        Data::Object(map) => !map.is_empty(),
    }
}

fn kind(value: &Data) -> &'static str {
    match value {
        Data::Null => "null",
        Data::Bool(_) => "boolean",
        Data::Number(_) => "number",
        Data::String(_) => "string",
        Data::Array(_) => "array",
        Data::Object(_) => "object",
    }
}

struct Parser {
    name: String,
}

impl Parser {
    fn error(&self, line: usize, message: String) -> TemplateError {
        TemplateError::Parse {
            name: self.name.clone(),
            line,
            message,
        }
    }

    fn lex(&self, source: &str) -> Result<Vec<Token>, TemplateError> {
        let mut tokens = Vec::new();
        let mut rest = source;
        let mut line = 1;
        let mut trim_next = false;

        while let Some(start) = rest.find("{{") {
            let mut text = &rest[..start];
            if trim_next {
                text = text.trim_start();
            }
            let after_open = &rest[start + 2..];
            let Some(close) = find_action_close(after_open) else {
                return Err(self.error(
                    line + text.matches('\n').count(),
                    "unclosed action".to_string(),
                ));
            };
            let mut inner = &after_open[..close];

            if let Some(stripped) = inner.strip_prefix('-') {
                if stripped.is_empty() || stripped.starts_with(char::is_whitespace) {
                    text = text.trim_end();
                    inner = stripped;
                }
            }
            trim_next = false;
            if let Some(stripped) = inner.strip_suffix('-') {
                if stripped.is_empty() || stripped.ends_with(char::is_whitespace) {
                    trim_next = true;
                    inner = stripped;
                }
            }

            line += rest[..start].matches('\n').count();
            if !text.is_empty() {
                tokens.push(Token::Text(text.to_string()));
            }

            let inner_trimmed = inner.trim();
            if !(inner_trimmed.starts_with("/*") && inner_trimmed.ends_with("*/")) {
                let action = self.parse_action(inner_trimmed, line)?;
                tokens.push(Token::Action { action, line });
            }

            line += inner.matches('\n').count();
            rest = &after_open[close + 2..];
        }

        let tail = if trim_next { rest.trim_start() } else { rest };
        if !tail.is_empty() {
            tokens.push(Token::Text(tail.to_string()));
        }
        Ok(tokens)
    }

    fn parse_action(&self, inner: &str, line: usize) -> Result<Action, TemplateError> {
        let words = self.split_words(inner, line)?;
        let Some(first) = words.first() else {
            return Err(self.error(line, "missing value for command".to_string()));
        };
        match first.as_str() {
            "end" | "else" if words.len() > 1 => Err(self.error(
                line,
                format!("unexpected {} in {first}", words[1]),
            )),
            "end" => Ok(Action::End),
            "else" => Ok(Action::Else),
            "range" => Ok(Action::Range(self.parse_expr(&words[1..], line, "range")?)),
            "if" => Ok(Action::If(self.parse_expr(&words[1..], line, "if")?)),
            _ => Ok(Action::Expr(self.parse_expr(&words, line, "command")?)),
        }
    }

    fn split_words(&self, inner: &str, line: usize) -> Result<Vec<String>, TemplateError> {
        let mut words = Vec::new();
        let mut chars = inner.chars().peekable();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
            } else if c == '"' {
                chars.next();
                let mut word = String::from('"');
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                word.push(match escaped {
                                    'n' => '\n',
                                    't' => '\t',
                                    other => other,
                                });
                            }
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        other => word.push(other),
                    }
                }
                if !closed {
                    return Err(self.error(line, "unterminated quoted string".to_string()));
                }
                words.push(word);
            } else {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                words.push(word);
            }
        }
        Ok(words)
    }

    fn parse_expr(&self, words: &[String], line: usize, context: &str) -> Result<Expr, TemplateError> {
        let Some(head) = words.first() else {
            return Err(self.error(line, format!("missing value for {context}")));
        };
        if head.starts_with('.') || head.starts_with('$') || head.starts_with('"') || head.parse::<i64>().is_ok() {
            if words.len() > 1 {
                return Err(self.error(
                    line,
                    format!("can't give argument to non-function {head}"),
                ));
            }
            return Ok(Expr::Operand(self.parse_operand(head, line)?));
        }
        let helper = Helper::lookup(head)
            .ok_or_else(|| self.error(line, format!("function \"{head}\" not defined")))?;
        let args = words[1..]
            .iter()
            .map(|w| self.parse_operand(w, line))
            .collect::<Result<Vec<_>, _>>()?;
        if args.len() != helper.arity() {
            return Err(self.error(
                line,
                format!(
                    "wrong number of args for {head}: want {} got {}",
                    helper.arity(),
                    args.len()
                ),
            ));
        }
        Ok(Expr::Call { helper, args })
    }

    fn parse_operand(&self, word: &str, line: usize) -> Result<Operand, TemplateError> {
        if let Some(s) = word.strip_prefix('"') {
            return Ok(Operand::Str(s.to_string()));
        }
        if let Ok(n) = word.parse::<i64>() {
            return Ok(Operand::Int(n));
        }
        let (from_root, path) = if word == "." {
            (false, "")
        } else if word == "$" {
            (true, "")
        } else if let Some(p) = word.strip_prefix("$.") {
            (true, p)
        } else if let Some(p) = word.strip_prefix('.') {
            (false, p)
        } else {
            return Err(self.error(line, format!("unexpected \"{word}\" in operand")));
        };
        let path: Vec<String> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(str::to_string).collect()
        };
        if path.iter().any(String::is_empty) {
            return Err(self.error(line, format!("bad field path \"{word}\"")));
        }
        Ok(Operand::Field { from_root, path })
    }

    /// Parse nodes until `{{else}}`, `{{end}}` or end of input. Returns the
    /// terminator that stopped the block, if any.
    fn parse_block<I>(
        &self,
        tokens: &mut I,
    ) -> Result<(Vec<Node>, Option<(&'static str, usize)>), TemplateError>
    where
        I: Iterator<Item = Token>,
    {
        let mut nodes = Vec::new();
        while let Some(token) = tokens.next() {
            match token {
                Token::Text(text) => nodes.push(Node::Text(text)),
                Token::Action { action, line } => match action {
                    Action::Expr(expr) => nodes.push(Node::Output { expr, line }),
                    Action::Else => return Ok((nodes, Some(("else", line)))),
                    Action::End => return Ok((nodes, Some(("end", line)))),
                    Action::Range(expr) => {
                        let (body, otherwise) = self.parse_branches(tokens, "range", line)?;
                        nodes.push(Node::Range {
                            expr,
                            body,
                            otherwise,
                            line,
                        });
                    }
                    Action::If(expr) => {
                        let (body, otherwise) = self.parse_branches(tokens, "if", line)?;
                        nodes.push(Node::If {
                            expr,
                            body,
                            otherwise,
                            line,
                        });
                    }
                },
            }
        }
        Ok((nodes, None))
    }

    fn parse_branches<I>(
        &self,
        tokens: &mut I,
        keyword: &str,
        open_line: usize,
    ) -> Result<(Vec<Node>, Vec<Node>), TemplateError>
    where
        I: Iterator<Item = Token>,
    {
        let (body, terminator) = self.parse_block(tokens)?;
        match terminator {
            Some(("end", _)) => Ok((body, Vec::new())),
            Some(("else", else_line)) => {
                let (otherwise, terminator) = self.parse_block(tokens)?;
                match terminator {
                    Some(("end", _)) => Ok((body, otherwise)),
                    Some((kind, line)) => Err(self.error(line, format!("unexpected {{{{{kind}}}}} after {{{{else}}}} at line {else_line}"))),
                    None => Err(self.error(open_line, format!("unexpected EOF in {keyword}"))),
                }
            }
            _ => Err(self.error(open_line, format!("unexpected EOF in {keyword}"))),
        }
    }
}
