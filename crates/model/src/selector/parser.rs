//! Recursive descent parser for selector expressions

use super::attribute::{resolve_trait_name, AttributePath, AttributeTest, Comparator, PathSegment};
use super::{SelectorSyntaxError, Step, TypeCategory};
use smithy_semantic_common::ShapeType;

/// Relationship names accepted inside `-[...]->`
pub(crate) const RELATIONSHIP_LABELS: &[&str] = &[
    "member",
    "input",
    "output",
    "error",
    "identifier",
    "property",
    "create",
    "read",
    "update",
    "delete",
    "list",
    "put",
    "operation",
    "collectionOperation",
    "instanceOperation",
    "resource",
    "mixin",
    "bound",
    "trait",
];

pub(super) struct SelectorParser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> SelectorParser<'a> {
    pub(super) fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.chars().collect(),
            position: 0,
        }
    }

    pub(super) fn parse(mut self) -> Result<Vec<Step>, SelectorSyntaxError> {
        let steps = self.parse_selector(false)?;
        self.skip_whitespace();
        if self.position < self.chars.len() {
            return Err(self.error(format!("Unexpected character `{}`", self.chars[self.position])));
        }
        Ok(steps)
    }

    /// Parse steps until the end of input, or a `,` or `)` inside a function
    fn parse_selector(&mut self, nested: bool) -> Result<Vec<Step>, SelectorSyntaxError> {
        let mut steps = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') | Some(')') if nested => break,
                Some(_) => steps.push(self.parse_step()?),
            }
        }
        if steps.is_empty() {
            return Err(self.error("Expected a selector".to_string()));
        }
        if let Some(Step::Forward(_) | Step::Reverse(_) | Step::RecursiveNeighbors) = steps.last() {
            return Err(self.error("Selector cannot end with a neighbor traversal".to_string()));
        }
        Ok(steps)
    }

    fn parse_step(&mut self) -> Result<Step, SelectorSyntaxError> {
        let Some(c) = self.peek() else {
            return Err(self.error("Unexpected end of selector".to_string()));
        };
        match c {
            '*' => {
                self.position += 1;
                Ok(Step::Any)
            }
            '>' => {
                self.position += 1;
                Ok(Step::Forward(Vec::new()))
            }
            '~' => {
                self.position += 1;
                self.expect('>')?;
                Ok(Step::RecursiveNeighbors)
            }
            '<' => {
                self.position += 1;
                if self.peek() == Some('-') {
                    self.position += 1;
                    self.expect('[')?;
                    let labels = self.parse_relationships()?;
                    self.expect('-')?;
                    Ok(Step::Reverse(labels))
                } else {
                    Ok(Step::Reverse(Vec::new()))
                }
            }
            '-' => {
                self.position += 1;
                self.expect('[')?;
                let labels = self.parse_relationships()?;
                self.expect('-')?;
                self.expect('>')?;
                Ok(Step::Forward(labels))
            }
            '[' => {
                self.position += 1;
                self.parse_attribute().map(Step::Attribute)
            }
            ':' => {
                self.position += 1;
                self.parse_function()
            }
            c if c.is_ascii_alphabetic() => {
                let start = self.position;
                let name = self.parse_identifier();
                shape_type_step(&name).ok_or_else(|| SelectorSyntaxError {
                    message: format!("Unknown shape type `{name}`"),
                    expression: self.expression.to_string(),
                    position: start,
                })
            }
            other => Err(self.error(format!("Unexpected character `{other}`"))),
        }
    }

    /// Parse `rel, rel]` after `[`
    fn parse_relationships(&mut self) -> Result<Vec<String>, SelectorSyntaxError> {
        let mut labels = Vec::new();
        loop {
            self.skip_whitespace();
            let label = self.parse_identifier();
            if label.is_empty() {
                return Err(self.error("Expected a relationship name".to_string()));
            }
            if !RELATIONSHIP_LABELS.contains(&label.as_str()) {
                tracing::warn!(
                    selector = self.expression,
                    relationship = %label,
                    "Unknown relationship type in selector"
                );
            }
            labels.push(label);
            self.skip_whitespace();
            match self.next() {
                Some(',') => continue,
                Some(']') => return Ok(labels),
                _ => return Err(self.error("Expected `,` or `]`".to_string())),
            }
        }
    }

    /// Parse the contents of `[...]` after the opening bracket
    fn parse_attribute(&mut self) -> Result<AttributeTest, SelectorSyntaxError> {
        self.skip_whitespace();
        let path = self.parse_path()?;
        self.skip_whitespace();

        if self.peek() == Some(']') {
            self.position += 1;
            return Ok(AttributeTest {
                path,
                comparator: None,
                values: Vec::new(),
                case_insensitive: false,
            });
        }

        let comparator = self.parse_comparator()?;
        let mut values = Vec::new();
        let mut case_insensitive = false;
        loop {
            self.skip_whitespace();
            values.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.position += 1;
                }
                Some(']') => {
                    self.position += 1;
                    break;
                }
                Some('i') => {
                    self.position += 1;
                    self.skip_whitespace();
                    self.expect(']')?;
                    case_insensitive = true;
                    break;
                }
                _ => return Err(self.error("Expected `,`, `i` or `]`".to_string())),
            }
        }

        Ok(AttributeTest {
            path,
            comparator: Some(comparator),
            values,
            case_insensitive,
        })
    }

    fn parse_path(&mut self) -> Result<AttributePath, SelectorSyntaxError> {
        let root = self.parse_identifier();
        let mut segments = Vec::new();
        while self.peek() == Some('|') {
            self.position += 1;
            segments.push(self.parse_path_segment()?);
        }

        match root.as_str() {
            "id" | "service" => {
                let part = match segments.as_slice() {
                    [] => None,
                    [PathSegment::Key(part)] => Some(part.clone()),
                    _ => return Err(self.error(format!("Invalid `{root}` attribute path"))),
                };
                Ok(if root == "id" {
                    AttributePath::Id(part)
                } else {
                    AttributePath::Service(part)
                })
            }
            "trait" => {
                let mut rest = segments.into_iter();
                match rest.next() {
                    None => Ok(AttributePath::Trait(None, Vec::new())),
                    Some(PathSegment::Key(name)) => {
                        let trait_id = resolve_trait_name(&name).ok_or_else(|| {
                            self.error(format!("Invalid trait name `{name}`"))
                        })?;
                        Ok(AttributePath::Trait(Some(trait_id), rest.collect()))
                    }
                    Some(projection) => {
                        let mut segments = vec![projection];
                        segments.extend(rest);
                        Ok(AttributePath::Trait(None, segments))
                    }
                }
            }
            "" => Err(self.error("Expected an attribute path".to_string())),
            other => Err(self.error(format!("Unknown attribute `{other}`"))),
        }
    }

    fn parse_path_segment(&mut self) -> Result<PathSegment, SelectorSyntaxError> {
        match self.peek() {
            Some('(') => {
                self.position += 1;
                let name = self.parse_identifier();
                self.expect(')')?;
                match name.as_str() {
                    "keys" => Ok(PathSegment::Keys),
                    "values" => Ok(PathSegment::Values),
                    "length" => Ok(PathSegment::Length),
                    other => Err(self.error(format!("Unknown projection `({other})`"))),
                }
            }
            Some('"') | Some('\'') => Ok(PathSegment::Key(self.parse_quoted()?)),
            _ => {
                let key = self.parse_shape_id_text();
                if key.is_empty() {
                    Err(self.error("Expected an attribute path segment".to_string()))
                } else {
                    Ok(PathSegment::Key(key))
                }
            }
        }
    }

    fn parse_comparator(&mut self) -> Result<Comparator, SelectorSyntaxError> {
        let two: String = self.chars[self.position..].iter().take(2).collect();
        if let Some(comparator) = Comparator::parse(&two) {
            self.position += 2;
            return Ok(comparator);
        }
        let one: String = self.chars[self.position..].iter().take(1).collect();
        if let Some(comparator) = Comparator::parse(&one) {
            self.position += 1;
            return Ok(comparator);
        }
        Err(self.error("Expected a comparator".to_string()))
    }

    fn parse_value(&mut self) -> Result<String, SelectorSyntaxError> {
        match self.peek() {
            Some('"') | Some('\'') => self.parse_quoted(),
            _ => {
                let start = self.position;
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#' | '$' | '-' | '+') {
                        self.position += 1;
                    } else {
                        break;
                    }
                }
                if start == self.position {
                    Err(self.error("Expected an attribute value".to_string()))
                } else {
                    Ok(self.chars[start..self.position].iter().collect())
                }
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String, SelectorSyntaxError> {
        let Some(quote) = self.next() else {
            return Err(self.error("Expected a quoted string".to_string()));
        };
        let mut value = String::new();
        loop {
            match self.next() {
                None => return Err(self.error("Unterminated string".to_string())),
                Some('\\') => match self.next() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("Unterminated string".to_string())),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
            }
        }
    }

    fn parse_function(&mut self) -> Result<Step, SelectorSyntaxError> {
        let name = self.parse_identifier();
        if name.is_empty() {
            return Err(self.error("Expected a function name".to_string()));
        }
        self.expect('(')?;

        let mut args = Vec::new();
        loop {
            args.push(self.parse_selector(true)?);
            self.skip_whitespace();
            match self.next() {
                Some(',') => continue,
                Some(')') => break,
                _ => return Err(self.error("Expected `,` or `)`".to_string())),
            }
        }

        let single =
            |args: Vec<Vec<Step>>, parser: &Self| -> Result<Vec<Step>, SelectorSyntaxError> {
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(only), None) => Ok(only),
                    _ => Err(parser.error(format!(":{name} expects a single selector"))),
                }
            };

        match name.as_str() {
            "not" => Ok(Step::Not(single(args, self)?)),
            "in" => Ok(Step::In(single(args, self)?)),
            "recursive" => Ok(Step::Recursive(single(args, self)?)),
            "is" | "each" => Ok(Step::Is(args)),
            "test" => Ok(Step::Test(args)),
            other => {
                tracing::warn!(
                    selector = self.expression,
                    function = other,
                    "Unknown selector function; it will match every shape"
                );
                Ok(Step::Any)
            }
        }
    }

    fn parse_identifier(&mut self) -> String {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.position += 1;
            } else {
                break;
            }
        }
        self.chars[start..self.position].iter().collect()
    }

    /// Identifier that may also contain `.`, `#` and `$`
    fn parse_shape_id_text(&mut self) -> String {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#' | '$') {
                self.position += 1;
            } else {
                break;
            }
        }
        self.chars[start..self.position].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.position += 1,
                Some('/') if self.chars.get(self.position + 1) == Some(&'/') => {
                    while let Some(c) = self.next() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorSyntaxError> {
        match self.next() {
            Some(c) if c == expected => Ok(()),
            _ => Err(self.error(format!("Expected `{expected}`"))),
        }
    }

    fn error(&self, message: String) -> SelectorSyntaxError {
        SelectorSyntaxError {
            message,
            expression: self.expression.to_string(),
            position: self.position,
        }
    }
}

fn shape_type_step(name: &str) -> Option<Step> {
    match name {
        "number" => Some(Step::Category(TypeCategory::Number)),
        "simpleType" => Some(Step::Category(TypeCategory::SimpleType)),
        "collection" => Some(Step::Category(TypeCategory::Collection)),
        other => other.parse::<ShapeType>().ok().map(Step::ShapeType),
    }
}
