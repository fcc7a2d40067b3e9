//! Tests for the arena tree, the child cursor and deep copies
//!
//! Covers:
//! - Cursor iteration order
//! - Type-checked replacement
//! - Removal from list and fixed-arity nodes
//! - Illegal cursor states
//! - Deep copy independence

use adql_ast::*;
use adql_diagnostics::TextPosition;
use pretty_assertions::assert_eq;

fn number(ast: &mut Ast, value: u64) -> NodeId {
    ast.leaf(NodeKind::Numeric(NumericLiteral::integer(value)))
}

fn column(ast: &mut Ast, name: &str) -> NodeId {
    ast.leaf(NodeKind::Column(ColumnRef::new(ColumnName::new(name))))
}

/// `SELECT <items> FROM t`
fn select(ast: &mut Ast, items: Vec<NodeId>) -> NodeId {
    let with = ast.leaf(NodeKind::With);
    let wrapped: Vec<_> = items
        .into_iter()
        .map(|item| ast.add(NodeKind::SelectItem(SelectItem::default()), [item]))
        .collect();
    let clause = ast.add(NodeKind::SelectClause(SelectClause::default()), wrapped);
    let table = ast.leaf(NodeKind::Table(TableRef {
        name: TableName::new("t"),
        alias: None,
    }));
    let filter = ast.leaf(NodeKind::Constraints(Constraints::clause()));
    let group = ast.leaf(NodeKind::GroupBy);
    let having = ast.leaf(NodeKind::Constraints(Constraints::clause()));
    let order = ast.leaf(NodeKind::OrderBy);
    let query = ast.add(
        NodeKind::Select(SelectQuery::default()),
        [with, clause, table, filter, group, having, order],
    );
    ast.set_root(query);
    query
}

// === Iteration ===

#[test]
fn test_cursor_visits_children_in_order() {
    let mut ast = Ast::new();
    let a = number(&mut ast, 1);
    let b = number(&mut ast, 2);
    let op = ast.add(NodeKind::Operation(Operator::Add), [a, b]);

    let mut cursor = ast.cursor(op);
    assert_eq!(cursor.next(&ast), Some(a));
    assert_eq!(cursor.index(), Some(0));
    assert_eq!(cursor.next(&ast), Some(b));
    assert_eq!(cursor.next(&ast), None);
    assert_eq!(cursor.index(), None);
}

#[test]
fn test_render_built_tree() {
    let mut ast = Ast::new();
    let ra = column(&mut ast, "ra");
    let one = number(&mut ast, 1);
    let sum = ast.add(NodeKind::Operation(Operator::Add), [ra, one]);
    select(&mut ast, vec![sum]);
    assert_eq!(ast.to_adql(), "SELECT ra + 1 FROM t");
}

// === Replacement ===

#[test]
fn test_replace_checks_slot_category() {
    let mut ast = Ast::new();
    let x = number(&mut ast, 4);
    let sqrt = ast.add(NodeKind::Math(MathFunction::Sqrt), [x]);
    let exists_query = ast.leaf(NodeKind::With);

    let mut cursor = ast.cursor(sqrt);
    cursor.next(&ast);
    let err = cursor.replace(&mut ast, exists_query).unwrap_err();
    assert!(matches!(err, TreeError::TypeMismatch { expected: SlotKind::Operand, .. }));
    assert_eq!(ast.children(sqrt), &[x]);

    let y = number(&mut ast, 9);
    cursor.replace(&mut ast, y).unwrap();
    assert_eq!(ast.render(sqrt), "SQRT(9)");
}

#[test]
fn test_replace_invalidates_parent_position() {
    let mut ast = Ast::new();
    let x = number(&mut ast, 4);
    let abs = ast.add(NodeKind::Math(MathFunction::Abs), [x]);
    ast.set_position(abs, Some(TextPosition::new(1, 8, 1, 14)));

    let mut cursor = ast.cursor(abs);
    cursor.next(&ast);
    let y = number(&mut ast, 5);
    cursor.replace(&mut ast, y).unwrap();
    assert_eq!(ast.position(abs), None);
}

#[test]
fn test_replace_before_next_is_illegal() {
    let mut ast = Ast::new();
    let x = number(&mut ast, 4);
    let abs = ast.add(NodeKind::Math(MathFunction::Abs), [x]);
    let y = number(&mut ast, 5);

    let mut cursor = ast.cursor(abs);
    let err = cursor.replace(&mut ast, y).unwrap_err();
    assert!(matches!(err, TreeError::IllegalState(_)));
    assert_eq!(err.code().to_string(), "ADQL0200");
}

#[test]
fn test_double_modification_is_illegal() {
    let mut ast = Ast::new();
    let items: Vec<_> = (1..=3).map(|i| number(&mut ast, i)).collect();
    let list = ast.add(NodeKind::OperandList, items);

    let mut cursor = ast.cursor(list);
    cursor.next(&ast);
    cursor.remove(&mut ast).unwrap();
    assert!(matches!(cursor.remove(&mut ast), Err(TreeError::IllegalState(_))));
    let z = number(&mut ast, 0);
    assert!(matches!(cursor.replace(&mut ast, z), Err(TreeError::IllegalState(_))));
}

// === Removal ===

#[test]
fn test_remove_from_list_continues_with_next_child() {
    let mut ast = Ast::new();
    let items: Vec<_> = (1..=3).map(|i| number(&mut ast, i)).collect();
    let list = ast.add(NodeKind::OperandList, items.clone());

    let mut cursor = ast.cursor(list);
    cursor.next(&ast);
    cursor.remove(&mut ast).unwrap();
    assert_eq!(cursor.next(&ast), Some(items[1]));
    assert_eq!(ast.render(list), "2, 3");
}

#[test]
fn test_remove_from_fixed_arity_node_fails() {
    let mut ast = Ast::new();
    let x = number(&mut ast, 4);
    let abs = ast.add(NodeKind::Math(MathFunction::Abs), [x]);

    let mut cursor = ast.cursor(abs);
    cursor.next(&ast);
    let err = cursor.remove(&mut ast).unwrap_err();
    assert!(matches!(err, TreeError::FixedArity { .. }));
    assert_eq!(ast.children(abs).len(), 1);
}

#[test]
fn test_coalesce_keeps_its_last_argument() {
    let mut ast = Ast::new();
    let a = column(&mut ast, "a");
    let b = column(&mut ast, "b");
    let coalesce = ast.add(NodeKind::Coalesce, [a, b]);

    let mut cursor = ast.cursor(coalesce);
    cursor.next(&ast);
    cursor.set(&mut ast, None).unwrap();
    cursor.next(&ast);
    let err = cursor.set(&mut ast, None).unwrap_err();
    assert_eq!(err, TreeError::MinimumArity { node: "COALESCE", min: 1 });
    assert_eq!(ast.render(coalesce), "COALESCE(b)");
}

#[test]
fn test_remove_constraint_drops_its_connector() {
    let mut ast = Ast::new();
    let mut items = Vec::new();
    for name in ["a", "b", "c"] {
        let col = column(&mut ast, name);
        items.push(ast.add(NodeKind::IsNull { negated: false }, [col]));
    }
    let constraints = ast.add(
        NodeKind::Constraints(Constraints {
            connectors: vec![Connector::And, Connector::Or, Connector::And],
            group: false,
        }),
        items,
    );
    assert_eq!(ast.render(constraints), "a IS NULL OR b IS NULL AND c IS NULL");

    let mut cursor = ast.cursor(constraints);
    cursor.next(&ast);
    cursor.next(&ast);
    cursor.remove(&mut ast).unwrap();
    assert_eq!(ast.render(constraints), "a IS NULL AND c IS NULL");
}

// === Copy ===

#[test]
fn test_copy_is_independent() {
    let mut ast = Ast::new();
    let x = number(&mut ast, 81);
    let abs = ast.add(NodeKind::Math(MathFunction::Abs), [x]);
    let query = select(&mut ast, vec![abs]);

    let copy = ast.copy_subtree(query).unwrap();
    assert_ne!(copy, query);
    assert_eq!(ast.render(copy), ast.render(query));

    let copied_ids = ast.descendants(copy);
    assert!(ast.descendants(query).iter().all(|id| !copied_ids.contains(id)));

    let mut cursor = ast.cursor(abs);
    cursor.next(&ast);
    let y = number(&mut ast, 16);
    cursor.replace(&mut ast, y).unwrap();
    assert_eq!(ast.render(query), "SELECT ABS(16) FROM t");
    assert_eq!(ast.render(copy), "SELECT ABS(81) FROM t");
}

#[test]
fn test_copy_adds_only_the_subtree() {
    let mut ast = Ast::new();
    let x = column(&mut ast, "ra");
    ast.set_position(x, Some(TextPosition::new(1, 12, 1, 14)));
    let abs = ast.add(NodeKind::Math(MathFunction::Abs), [x]);
    select(&mut ast, vec![abs]);
    let before = ast.len();

    let copy = ast.copy_subtree(abs).unwrap();
    assert_eq!(ast.len(), before + 2);
    assert_eq!(ast.render(copy), "ABS(ra)");
    let copied_column = ast.children(copy)[0];
    assert_ne!(copied_column, x);
    assert_eq!(ast.position(copied_column), Some(TextPosition::new(1, 12, 1, 14)));
}

#[test]
fn test_extract_builds_standalone_tree() {
    let mut ast = Ast::new();
    let x = number(&mut ast, 2);
    let pi = ast.leaf(NodeKind::Math(MathFunction::Pi));
    let product = ast.add(NodeKind::Operation(Operator::Multiply), [x, pi]);
    select(&mut ast, vec![product]);

    let extracted = ast.extract(product).unwrap();
    assert_eq!(extracted.len(), 3);
    assert_eq!(extracted.to_adql(), "2 * PI()");
}

#[test]
fn test_copy_of_foreign_id_fails() {
    let ast = Ast::new();
    let mut other = Ast::new();
    let id = number(&mut other, 1);
    let err = ast.extract(id).unwrap_err();
    assert_eq!(err, TreeError::UnknownNode(id));

    let mut ast = ast;
    let err = ast.copy_subtree(id).unwrap_err();
    assert_eq!(err, TreeError::UnknownNode(id));
    assert!(ast.is_empty());
}

// === Types ===

#[test]
fn test_value_types() {
    let mut ast = Ast::new();
    let col = column(&mut ast, "x");
    assert!(ast.value_types(col).is_any());

    let text = ast.leaf(NodeKind::Text(StringLiteral::new("ICRS")));
    let ra = number(&mut ast, 10);
    let dec = number(&mut ast, 20);
    let point = ast.add(
        NodeKind::Geometry(Geometry {
            function: GeometryFunction::Point,
            coord_sys: true,
        }),
        [text, ra, dec],
    );
    assert_eq!(ast.value_types(point), ValueTypes::GEOMETRY);
    assert_eq!(ast.render(point), "POINT('ICRS', 10, 20)");

    let max = ast.add(
        NodeKind::Aggregate(Aggregate {
            function: AggregateFunction::Max,
            distinct: false,
        }),
        [text],
    );
    assert!(ast.is_string(max) && !ast.is_numeric(max));

    if let NodeKind::Column(c) = ast.kind_mut(col) {
        c.binding = Some(ColumnBinding {
            table: "t".into(),
            db_name: "x".into(),
            datatype: DbType::new(DbTypeKind::Double),
        });
    }
    assert_eq!(ast.value_types(col), ValueTypes::NUMERIC);
}
