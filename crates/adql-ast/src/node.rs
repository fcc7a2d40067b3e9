//! Node kinds of the ADQL tree
//!
//! A [`NodeKind`] carries the scalar data of a node (operators, names,
//! flags); sub-nodes live in the arena and are referenced by id. Each kind
//! declares which category of node every child slot accepts ([`SlotKind`])
//! and whether its child list may shrink ([`Arity`]).

use crate::{ColumnName, DbType, ExpectedType, FunctionDef, Identifier, TableName};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of a node in its [`crate::Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// All ADQL constructs
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // === Queries ===
    /// Children: WITH, SELECT clause, FROM content, WHERE, GROUP BY, HAVING, ORDER BY
    Select(SelectQuery),
    /// Children: WITH, left query, right query, ORDER BY
    SetOperation(SetOperation),
    /// Common table expressions (list of `WithItem`)
    With,
    /// Children: the named query
    WithItem(WithItem),

    // === Clauses ===
    /// List of `SelectItem` / `SelectAll`
    SelectClause(SelectClause),
    /// Children: the selected operand
    SelectItem(SelectItem),
    /// `*` or `t.*`
    SelectAll(SelectAll),
    /// List of operands
    GroupBy,
    /// List of `OrderItem`
    OrderBy,
    /// Children: the sort key
    OrderItem(OrderItem),

    // === FROM content ===
    Table(TableRef),
    /// Children: the subquery
    SubqueryTable(SubqueryTable),
    /// Children: left, right, ON constraints (possibly empty)
    Join(Join),

    // === Constraints ===
    /// WHERE / HAVING / ON clause body or a parenthesised group
    Constraints(Constraints),
    /// Children: the negated constraint
    Not,
    Comparison(ComparisonOperator),
    /// Children: value, lower bound, upper bound
    Between { negated: bool },
    /// Children: value, `OperandList` or subquery
    In { negated: bool },
    Like { negated: bool, case_insensitive: bool },
    IsNull { negated: bool },
    /// Children: the subquery
    Exists,
    /// Value list of an IN constraint
    OperandList,

    // === Operands ===
    Column(ColumnRef),
    Numeric(NumericLiteral),
    Text(StringLiteral),
    Operation(Operator),
    Unary(UnaryOperator),
    Concatenation,
    /// Parenthesised operand
    Wrapped,
    Math(MathFunction),
    Aggregate(Aggregate),
    Geometry(Geometry),
    StringFunction(StringFunction),
    Coalesce,
    Cast(CastType),
    /// Children: value, unit string
    InUnit,
    UserFunction(UserFunction),
}

/// Category of node a child slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Query,
    With,
    WithItem,
    SelectClause,
    SelectItem,
    FromContent,
    /// Clause-level constraint list (WHERE, HAVING, ON)
    Constraints,
    Constraint,
    Operand,
    /// Right side of IN: a value list or a subquery
    InValues,
    GroupBy,
    OrderBy,
    OrderItem,
    /// Index past the last child of a fixed-arity node
    None,
}

impl SlotKind {
    pub fn accepts(self, kind: &NodeKind) -> bool {
        match self {
            SlotKind::Query => kind.is_query(),
            SlotKind::With => matches!(kind, NodeKind::With),
            SlotKind::WithItem => matches!(kind, NodeKind::WithItem(_)),
            SlotKind::SelectClause => matches!(kind, NodeKind::SelectClause(_)),
            SlotKind::SelectItem => matches!(kind, NodeKind::SelectItem(_) | NodeKind::SelectAll(_)),
            SlotKind::FromContent => kind.is_from_content(),
            SlotKind::Constraints => matches!(kind, NodeKind::Constraints(_)),
            SlotKind::Constraint => kind.is_constraint(),
            SlotKind::Operand => kind.is_operand(),
            SlotKind::InValues => matches!(kind, NodeKind::OperandList) || kind.is_query(),
            SlotKind::GroupBy => matches!(kind, NodeKind::GroupBy),
            SlotKind::OrderBy => matches!(kind, NodeKind::OrderBy),
            SlotKind::OrderItem => matches!(kind, NodeKind::OrderItem(_)),
            SlotKind::None => false,
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::Query => "query",
            SlotKind::With => "WITH clause",
            SlotKind::WithItem => "WITH item",
            SlotKind::SelectClause => "SELECT clause",
            SlotKind::SelectItem => "select item",
            SlotKind::FromContent => "FROM content",
            SlotKind::Constraints => "constraint list",
            SlotKind::Constraint => "constraint",
            SlotKind::Operand => "operand",
            SlotKind::InValues => "IN values",
            SlotKind::GroupBy => "GROUP BY clause",
            SlotKind::OrderBy => "ORDER BY clause",
            SlotKind::OrderItem => "ORDER BY item",
            SlotKind::None => "non-existent",
        };
        f.write_str(name)
    }
}

/// Whether children can be removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Children can be replaced but never removed
    Fixed,
    /// Variable-length list that can shrink down to `min` children
    List { min: usize },
}

impl NodeKind {
    pub fn is_query(&self) -> bool {
        matches!(self, NodeKind::Select(_) | NodeKind::SetOperation(_))
    }

    pub fn is_from_content(&self) -> bool {
        matches!(
            self,
            NodeKind::Table(_) | NodeKind::SubqueryTable(_) | NodeKind::Join(_)
        )
    }

    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            NodeKind::Constraints(_)
                | NodeKind::Not
                | NodeKind::Comparison(_)
                | NodeKind::Between { .. }
                | NodeKind::In { .. }
                | NodeKind::Like { .. }
                | NodeKind::IsNull { .. }
                | NodeKind::Exists
        )
    }

    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            NodeKind::Column(_)
                | NodeKind::Numeric(_)
                | NodeKind::Text(_)
                | NodeKind::Operation(_)
                | NodeKind::Unary(_)
                | NodeKind::Concatenation
                | NodeKind::Wrapped
                | NodeKind::Math(_)
                | NodeKind::Aggregate(_)
                | NodeKind::Geometry(_)
                | NodeKind::StringFunction(_)
                | NodeKind::Coalesce
                | NodeKind::Cast(_)
                | NodeKind::InUnit
                | NodeKind::UserFunction(_)
        )
    }

    /// Function call of any family
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            NodeKind::Math(_)
                | NodeKind::Aggregate(_)
                | NodeKind::Geometry(_)
                | NodeKind::StringFunction(_)
                | NodeKind::Coalesce
                | NodeKind::Cast(_)
                | NodeKind::InUnit
                | NodeKind::UserFunction(_)
        )
    }

    /// Category accepted by the child slot at `index`
    pub fn slot(&self, index: usize) -> SlotKind {
        use SlotKind as S;
        let fixed = |slots: &[SlotKind]| slots.get(index).copied().unwrap_or(S::None);
        match self {
            NodeKind::Select(_) => fixed(&[
                S::With,
                S::SelectClause,
                S::FromContent,
                S::Constraints,
                S::GroupBy,
                S::Constraints,
                S::OrderBy,
            ]),
            NodeKind::SetOperation(_) => fixed(&[S::With, S::Query, S::Query, S::OrderBy]),
            NodeKind::With => S::WithItem,
            NodeKind::WithItem(_) | NodeKind::SubqueryTable(_) | NodeKind::Exists => {
                fixed(&[S::Query])
            }
            NodeKind::SelectClause(_) => S::SelectItem,
            NodeKind::SelectItem(_) | NodeKind::OrderItem(_) => fixed(&[S::Operand]),
            NodeKind::GroupBy | NodeKind::OperandList => S::Operand,
            NodeKind::OrderBy => S::OrderItem,
            NodeKind::Join(_) => fixed(&[S::FromContent, S::FromContent, S::Constraints]),
            NodeKind::Constraints(_) => S::Constraint,
            NodeKind::Not => fixed(&[S::Constraint]),
            NodeKind::In { .. } => fixed(&[S::Operand, S::InValues]),
            NodeKind::Table(_) | NodeKind::SelectAll(_) => S::None,
            NodeKind::Column(_) | NodeKind::Numeric(_) | NodeKind::Text(_) => S::None,
            _ => S::Operand,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            NodeKind::With | NodeKind::GroupBy | NodeKind::OrderBy => Arity::List { min: 0 },
            NodeKind::Constraints(c) if c.group => Arity::List { min: 1 },
            NodeKind::Constraints(_) => Arity::List { min: 0 },
            NodeKind::SelectClause(_) | NodeKind::OperandList | NodeKind::Coalesce => {
                Arity::List { min: 1 }
            }
            NodeKind::Concatenation => Arity::List { min: 2 },
            _ => Arity::Fixed,
        }
    }

    /// Short name of the construct, as used in messages
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Select(_) => "SELECT query",
            NodeKind::SetOperation(op) => op.op.keyword(),
            NodeKind::With => "WITH",
            NodeKind::WithItem(_) => "WITH item",
            NodeKind::SelectClause(_) => "SELECT",
            NodeKind::SelectItem(_) => "select item",
            NodeKind::SelectAll(_) => "*",
            NodeKind::GroupBy => "GROUP BY",
            NodeKind::OrderBy => "ORDER BY",
            NodeKind::OrderItem(_) => "ORDER BY item",
            NodeKind::Table(_) => "table",
            NodeKind::SubqueryTable(_) => "subquery",
            NodeKind::Join(_) => "JOIN",
            NodeKind::Constraints(_) => "constraints",
            NodeKind::Not => "NOT",
            NodeKind::Comparison(op) => op.symbol(),
            NodeKind::Between { .. } => "BETWEEN",
            NodeKind::In { .. } => "IN",
            NodeKind::Like {
                case_insensitive: true,
                ..
            } => "ILIKE",
            NodeKind::Like { .. } => "LIKE",
            NodeKind::IsNull { .. } => "IS NULL",
            NodeKind::Exists => "EXISTS",
            NodeKind::OperandList => "value list",
            NodeKind::Column(_) => "column",
            NodeKind::Numeric(_) => "numeric",
            NodeKind::Text(_) => "string",
            NodeKind::Operation(op) => op.symbol(),
            NodeKind::Unary(op) => op.symbol(),
            NodeKind::Concatenation => "||",
            NodeKind::Wrapped => "(...)",
            NodeKind::Math(f) => f.name(),
            NodeKind::Aggregate(a) => a.function.name(),
            NodeKind::Geometry(g) => g.function.name(),
            NodeKind::StringFunction(f) => f.name(),
            NodeKind::Coalesce => "COALESCE",
            NodeKind::Cast(_) => "CAST",
            NodeKind::InUnit => "IN_UNIT",
            NodeKind::UserFunction(_) => "user defined function",
        }
    }
}

// === Queries ===

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub op: SetOperator,
    pub all: bool,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperator {
    Union,
    Except,
    Intersect,
}

impl SetOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::Except => "EXCEPT",
            SetOperator::Intersect => "INTERSECT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub label: Identifier,
    pub columns: Vec<Identifier>,
}

// === Clauses ===

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectClause {
    pub distinct: bool,
    pub top: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectItem {
    pub alias: Option<Identifier>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectAll {
    /// `t.*` when set
    pub table: Option<TableName>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderItem {
    pub descending: bool,
}

// === FROM ===

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: TableName,
    pub alias: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryTable {
    pub alias: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub natural: bool,
    /// `USING (...)` columns; empty when absent
    pub using: Vec<Identifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    /// Comma-separated FROM items
    Cross,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
            JoinKind::Cross => ",",
        }
    }
}

// === Constraints ===

/// Constraint list.
///
/// `connectors[i]` links child `i` to the one before it, so
/// `connectors[0]` is never rendered. The vector always has one entry per
/// child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub connectors: Vec<Connector>,
    /// Parenthesised group rather than a clause body
    pub group: bool,
}

impl Constraints {
    pub fn clause() -> Self {
        Self::default()
    }

    pub fn group() -> Self {
        Self {
            connectors: Vec::new(),
            group: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    pub fn keyword(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "<>",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::GreaterOrEqual => ">=",
        }
    }
}

// === Operands ===

/// Reference to a column (or a select-list alias) whose type stays unknown
/// until a checker binds it to the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub name: ColumnName,
    /// Type the surrounding expression expects
    pub expected: Option<ExpectedType>,
    pub binding: Option<ColumnBinding>,
}

impl ColumnRef {
    pub fn new(name: ColumnName) -> Self {
        Self {
            name,
            expected: None,
            binding: None,
        }
    }
}

/// Schema column a reference was resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    /// Table (or alias) providing the column
    pub table: String,
    /// Column name in the database
    pub db_name: String,
    pub datatype: DbType,
}

/// Numeric literal, kept as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericLiteral {
    pub text: String,
    pub kind: NumberKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberKind {
    /// `42`
    Integer,
    /// `4.2`, `.5`
    Decimal,
    /// `4.2e-3`
    Real,
    /// `0x2A`
    Hex,
}

impl NumericLiteral {
    pub fn new(text: impl Into<String>, kind: NumberKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn integer(value: u64) -> Self {
        Self::new(value.to_string(), NumberKind::Integer)
    }

    /// Exact value, when it fits a `Decimal`
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self.kind {
            NumberKind::Integer | NumberKind::Decimal => Decimal::from_str(&self.text).ok(),
            NumberKind::Real => Decimal::from_scientific(&self.text).ok(),
            NumberKind::Hex => self.as_u64().map(Decimal::from),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.kind {
            NumberKind::Integer => self.text.parse().ok(),
            NumberKind::Hex => {
                let digits = self
                    .text
                    .strip_prefix("0x")
                    .or_else(|| self.text.strip_prefix("0X"))?;
                u64::from_str_radix(digits, 16).ok()
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            NumberKind::Hex => self.as_u64().map(|v| v as f64),
            _ => self.text.parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub value: String,
}

impl StringLiteral {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    BitAnd,
    BitOr,
    BitXor,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
        }
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(self, Operator::BitAnd | Operator::BitOr | Operator::BitXor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Minus,
    Plus,
    BitNot,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::BitNot => "~",
        }
    }
}

macro_rules! function_names {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|f| f.name().eq_ignore_ascii_case(name))
            }
        }
    };
}

function_names!(
    /// Mathematical and trigonometric functions
    MathFunction {
        Abs => "ABS",
        Ceiling => "CEILING",
        Degrees => "DEGREES",
        Exp => "EXP",
        Floor => "FLOOR",
        Log => "LOG",
        Log10 => "LOG10",
        Mod => "MOD",
        Pi => "PI",
        Power => "POWER",
        Radians => "RADIANS",
        Rand => "RAND",
        Round => "ROUND",
        Sqrt => "SQRT",
        Truncate => "TRUNCATE",
        Acos => "ACOS",
        Asin => "ASIN",
        Atan => "ATAN",
        Atan2 => "ATAN2",
        Cos => "COS",
        Cot => "COT",
        Sin => "SIN",
        Tan => "TAN",
    }
);

impl MathFunction {
    /// Accepted argument counts (inclusive)
    pub fn arity(&self) -> (usize, usize) {
        match self {
            MathFunction::Pi => (0, 0),
            MathFunction::Rand => (0, 1),
            MathFunction::Round | MathFunction::Truncate => (1, 2),
            MathFunction::Mod | MathFunction::Power | MathFunction::Atan2 => (2, 2),
            _ => (1, 1),
        }
    }
}

function_names!(
    /// Aggregate functions
    AggregateFunction {
        Count => "COUNT",
        Avg => "AVG",
        Max => "MAX",
        Min => "MIN",
        Sum => "SUM",
    }
);

function_names!(
    /// Geometrical functions
    GeometryFunction {
        Area => "AREA",
        Box => "BOX",
        Centroid => "CENTROID",
        Circle => "CIRCLE",
        Contains => "CONTAINS",
        Coord1 => "COORD1",
        Coord2 => "COORD2",
        CoordSys => "COORDSYS",
        Distance => "DISTANCE",
        Intersects => "INTERSECTS",
        Point => "POINT",
        Polygon => "POLYGON",
        Region => "REGION",
    }
);

function_names!(
    /// String functions
    StringFunction {
        Lower => "LOWER",
        Upper => "UPPER",
    }
);

/// Aggregate call; no child means `COUNT(*)`
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub distinct: bool,
}

/// Geometry call; with `coord_sys` set the first child is the
/// coordinate-system string
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub function: GeometryFunction,
    pub coord_sys: bool,
}

/// Target type of a CAST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastType {
    Smallint,
    Integer,
    Bigint,
    Real,
    DoublePrecision,
    Char(Option<u32>),
    Varchar(Option<u32>),
    Timestamp,
}

impl CastType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CastType::Smallint
                | CastType::Integer
                | CastType::Bigint
                | CastType::Real
                | CastType::DoublePrecision
        )
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastType::Smallint => f.write_str("SMALLINT"),
            CastType::Integer => f.write_str("INTEGER"),
            CastType::Bigint => f.write_str("BIGINT"),
            CastType::Real => f.write_str("REAL"),
            CastType::DoublePrecision => f.write_str("DOUBLE PRECISION"),
            CastType::Char(None) => f.write_str("CHAR"),
            CastType::Char(Some(n)) => write!(f, "CHAR({n})"),
            CastType::Varchar(None) => f.write_str("VARCHAR"),
            CastType::Varchar(Some(n)) => write!(f, "VARCHAR({n})"),
            CastType::Timestamp => f.write_str("TIMESTAMP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    pub name: String,
    /// Declared signature this call was matched to
    pub definition: Option<FunctionDef>,
}

impl UserFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_lookup_is_case_insensitive() {
        assert_eq!(MathFunction::from_name("sqrt"), Some(MathFunction::Sqrt));
        assert_eq!(GeometryFunction::from_name("Coord1"), Some(GeometryFunction::Coord1));
        assert_eq!(StringFunction::from_name("lower"), Some(StringFunction::Lower));
        assert_eq!(MathFunction::from_name("foo"), None);
    }

    #[test]
    fn test_slot_categories() {
        let select = NodeKind::Select(SelectQuery::default());
        assert_eq!(select.slot(2), SlotKind::FromContent);
        assert_eq!(select.slot(7), SlotKind::None);
        assert!(SlotKind::Operand.accepts(&NodeKind::Numeric(NumericLiteral::integer(1))));
        assert!(!SlotKind::Operand.accepts(&NodeKind::Exists));
        assert!(SlotKind::InValues.accepts(&NodeKind::OperandList));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(NumericLiteral::new("0x1F", NumberKind::Hex).as_u64(), Some(31));
        assert_eq!(
            NumericLiteral::new("1.50", NumberKind::Decimal).as_decimal(),
            Some(Decimal::new(150, 2))
        );
        assert_eq!(NumericLiteral::new("2e3", NumberKind::Real).as_f64(), Some(2000.0));
    }

    #[test]
    fn test_malformed_hex_has_no_value() {
        assert_eq!(NumericLiteral::new("0XfF", NumberKind::Hex).as_u64(), Some(255));
        for text in ["", "0", "x", "é1", "1F", "0x"] {
            assert_eq!(NumericLiteral::new(text, NumberKind::Hex).as_u64(), None, "{text}");
            assert_eq!(NumericLiteral::new(text, NumberKind::Hex).as_decimal(), None, "{text}");
        }
    }
}
