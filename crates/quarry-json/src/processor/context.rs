use std::fmt::Display;

use crate::error::JsonError;

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Root,
    Field(&'a str),
    Index(usize),
}

/// The location of the value being processed, rendered as `<root>/field[0]`.
/// Contexts are linked to their parent on the stack, so entering a child is free.
#[derive(Debug)]
pub(crate) struct Context<'a> {
    parent: Option<&'a Context<'a>>,
    segment: Segment<'a>,
}

impl<'a> Context<'a> {
    pub fn root() -> Context<'static> {
        Context {
            parent: None,
            segment: Segment::Root,
        }
    }

    pub fn field<'b>(&'b self, name: &'b str) -> Context<'b> {
        Context {
            parent: Some(self),
            segment: Segment::Field(name),
        }
    }

    pub fn index(&self, index: usize) -> Context<'_> {
        Context {
            parent: Some(self),
            segment: Segment::Index(index),
        }
    }

    pub fn error(&self, message: impl Into<String>) -> JsonError {
        JsonError::parse(self.to_string(), message)
    }
}

impl Display for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(parent) = self.parent {
            parent.fmt(f)?;
        }
        match self.segment {
            Segment::Root => write!(f, "<root>"),
            Segment::Field(name) => write!(f, "/{name}"),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let root = Context::root();
        let field = root.field("trades");
        let index = field.index(2);
        let leaf = index.field("price");
        assert_eq!(leaf.to_string(), "<root>/trades[2]/price");
        assert_eq!(root.to_string(), "<root>");
    }
}
