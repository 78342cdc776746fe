//! Pattern AST node types for destructuring

use super::*;

/// A binding or assignment pattern
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    /// Simple identifier binding
    Identifier(Identifier),

    /// Array destructuring pattern [a, b, c]
    #[serde(rename = "ArrayPattern")]
    Array(ArrayPattern),

    /// Object destructuring pattern {a, b, c}
    #[serde(rename = "ObjectPattern")]
    Object(ObjectPattern),

    /// Assignment pattern with default value a = 1
    #[serde(rename = "AssignmentPattern")]
    Assignment(Box<AssignmentPattern>),

    /// Rest pattern ...rest
    #[serde(rename = "RestElement")]
    Rest(Box<RestElement>),

    /// Member expression (for assignment targets, not declarations)
    #[serde(rename = "MemberExpression")]
    Member(Box<MemberExpression>),
}

impl Pattern {
    /// Get the span of this pattern
    pub fn span(&self) -> Span {
        match self {
            Pattern::Identifier(id) => id.span,
            Pattern::Array(a) => a.span,
            Pattern::Object(o) => o.span,
            Pattern::Assignment(a) => a.span,
            Pattern::Rest(r) => r.span,
            Pattern::Member(m) => m.span,
        }
    }

    /// Whether the pattern destructures (object or array form)
    pub fn is_destructuring(&self) -> bool {
        matches!(self, Pattern::Array(_) | Pattern::Object(_))
    }

    /// The identifier, if this is a plain identifier pattern
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Pattern::Identifier(id) => Some(id),
            _ => None,
        }
    }
}

/// Array destructuring pattern
#[derive(Debug, Clone, Deserialize)]
pub struct ArrayPattern {
    /// Elements (None for holes); a trailing RestElement collects the rest
    pub elements: Vec<Option<Pattern>>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Object destructuring pattern
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectPattern {
    /// Properties; a trailing RestElement collects the rest
    pub properties: Vec<ObjectPatternProperty>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Object pattern property
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectPatternProperty {
    /// key: pattern
    Property(PatternProperty),
    /// ...rest
    #[serde(rename = "RestElement")]
    Rest(RestElement),
}

/// Object pattern key/value pair
#[derive(Debug, Clone, Deserialize)]
pub struct PatternProperty {
    /// Property key
    pub key: Expression,
    /// Target pattern
    pub value: Pattern,
    /// Computed key
    #[serde(default)]
    pub computed: bool,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Assignment pattern (pattern with default)
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentPattern {
    /// Target
    pub left: Pattern,
    /// Default value
    pub right: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Rest element
#[derive(Debug, Clone, Deserialize)]
pub struct RestElement {
    /// Target
    pub argument: Pattern,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}
