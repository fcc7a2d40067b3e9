//! Value types of operands
//!
//! Operands answer three non-exclusive questions: may the value be numeric,
//! a string, a geometry? A column or user-defined function whose type is not
//! known yet answers yes to all three until a checker binds it.

use crate::{AggregateFunction, Ast, DbType, GeometryFunction, NodeId, NodeKind};

/// Type a surrounding expression expects from an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpectedType {
    Numeric,
    String,
    Geometry,
}

impl ExpectedType {
    /// One-letter hint (`N`, `S` or `G`)
    pub fn as_char(&self) -> char {
        match self {
            ExpectedType::Numeric => 'N',
            ExpectedType::String => 'S',
            ExpectedType::Geometry => 'G',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'N' => Some(ExpectedType::Numeric),
            'S' => Some(ExpectedType::String),
            'G' => Some(ExpectedType::Geometry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueTypes {
    pub numeric: bool,
    pub string: bool,
    pub geometry: bool,
}

impl ValueTypes {
    pub const ANY: ValueTypes = ValueTypes::new(true, true, true);
    pub const NONE: ValueTypes = ValueTypes::new(false, false, false);
    pub const NUMERIC: ValueTypes = ValueTypes::new(true, false, false);
    pub const STRING: ValueTypes = ValueTypes::new(false, true, false);
    pub const GEOMETRY: ValueTypes = ValueTypes::new(false, false, true);

    pub const fn new(numeric: bool, string: bool, geometry: bool) -> Self {
        Self {
            numeric,
            string,
            geometry,
        }
    }

    pub fn from_db_type(datatype: &DbType) -> Self {
        Self::new(
            datatype.is_numeric(),
            datatype.is_string(),
            datatype.is_geometry(),
        )
    }

    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }

    pub fn intersect(self, other: Self) -> Self {
        Self::new(
            self.numeric && other.numeric,
            self.string && other.string,
            self.geometry && other.geometry,
        )
    }

    pub fn allows(&self, expected: ExpectedType) -> bool {
        match expected {
            ExpectedType::Numeric => self.numeric,
            ExpectedType::String => self.string,
            ExpectedType::Geometry => self.geometry,
        }
    }
}

impl Ast {
    /// Possible value types of a node; non-operands have none
    pub fn value_types(&self, id: NodeId) -> ValueTypes {
        match self.kind(id) {
            NodeKind::Column(column) => match &column.binding {
                Some(binding) => ValueTypes::from_db_type(&binding.datatype),
                None => ValueTypes::ANY,
            },
            NodeKind::Numeric(_)
            | NodeKind::Operation(_)
            | NodeKind::Unary(_)
            | NodeKind::Math(_)
            | NodeKind::InUnit => ValueTypes::NUMERIC,
            NodeKind::Text(_) | NodeKind::Concatenation | NodeKind::StringFunction(_) => {
                ValueTypes::STRING
            }
            NodeKind::Wrapped => self.first_child_types(id),
            NodeKind::Aggregate(aggregate) => match aggregate.function {
                AggregateFunction::Min | AggregateFunction::Max => self.first_child_types(id),
                _ => ValueTypes::NUMERIC,
            },
            NodeKind::Geometry(geometry) => match geometry.function {
                GeometryFunction::Area
                | GeometryFunction::Coord1
                | GeometryFunction::Coord2
                | GeometryFunction::Distance
                | GeometryFunction::Contains
                | GeometryFunction::Intersects => ValueTypes::NUMERIC,
                GeometryFunction::CoordSys => ValueTypes::STRING,
                _ => ValueTypes::GEOMETRY,
            },
            NodeKind::Coalesce => self
                .children(id)
                .iter()
                .fold(ValueTypes::ANY, |acc, &arg| acc.intersect(self.value_types(arg))),
            NodeKind::Cast(target) if target.is_numeric() => ValueTypes::NUMERIC,
            NodeKind::Cast(_) => ValueTypes::STRING,
            NodeKind::UserFunction(udf) => match &udf.definition {
                Some(def) => ValueTypes::from_db_type(&def.return_type),
                None => ValueTypes::ANY,
            },
            _ => ValueTypes::NONE,
        }
    }

    pub fn is_numeric(&self, id: NodeId) -> bool {
        self.value_types(id).numeric
    }

    pub fn is_string(&self, id: NodeId) -> bool {
        self.value_types(id).string
    }

    pub fn is_geometry(&self, id: NodeId) -> bool {
        self.value_types(id).geometry
    }

    fn first_child_types(&self, id: NodeId) -> ValueTypes {
        self.child(id, 0)
            .map(|child| self.value_types(child))
            .unwrap_or(ValueTypes::ANY)
    }
}
