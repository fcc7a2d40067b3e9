//! Rewriting parsed queries with search/replace

use adql_ast::search::{Replace, columns_of_query, nested_queries, used_features};
use adql_ast::*;
use adql_parser::parse;
use pretty_assertions::assert_eq;

fn is_math(ast: &Ast, id: NodeId) -> bool {
    matches!(ast.kind(id), NodeKind::Math(_))
}

#[test]
fn test_replace_math_with_udf() {
    let mut ast = parse("SELECT SQRT(ABS(81)) FROM t").unwrap();
    let root = ast.root().unwrap();
    let report = Replace::new(is_math, |ast: &mut Ast, id: NodeId| {
        let args = ast.children(id).to_vec();
        Ok(Some(ast.add(NodeKind::UserFunction(UserFunction::new("foo")), args)))
    })
    .run(&mut ast, root);

    assert_eq!(report.matched, 2);
    assert!(report.is_complete());
    let rendered = ast.to_adql();
    assert_eq!(rendered, "SELECT foo(foo(81)) FROM t");
    assert_eq!(parse(&rendered).unwrap().to_adql(), rendered);
}

#[test]
fn test_failed_replacement_is_reported() {
    let mut ast = parse("SELECT ABS(a), SQRT(b) FROM t").unwrap();
    let root = ast.root().unwrap();
    let report = Replace::new(is_math, |ast: &mut Ast, id: NodeId| match ast.kind(id) {
        NodeKind::Math(MathFunction::Sqrt) => Err("no replacement for SQRT".to_string()),
        _ => Ok(Some(ast.children(id)[0])),
    })
    .run(&mut ast, root);

    assert!(!report.is_complete());
    let errors: Vec<_> = report.errors().map(|(_, e)| e.to_string()).collect();
    assert_eq!(errors, vec!["no replacement for SQRT"]);
    assert_eq!(ast.to_adql(), "SELECT a, SQRT(b) FROM t");
}

#[test]
fn test_columns_stay_in_their_query() {
    let ast = parse("SELECT a FROM t WHERE b IN (SELECT c FROM u WHERE d > 0)").unwrap();
    let outer = ast.root().unwrap();
    let inner = nested_queries(&ast, outer);
    assert_eq!(inner.len(), 1);

    let names = |query| -> Vec<String> {
        columns_of_query(&ast, query)
            .nodes()
            .into_iter()
            .map(|id| match ast.kind(id) {
                NodeKind::Column(column) => column.name.column.name.clone(),
                other => panic!("not a column: {other:?}"),
            })
            .collect()
    };
    assert_eq!(names(outer), vec!["a", "b"]);
    assert_eq!(names(inner[0]), vec!["c", "d"]);
}

#[test]
fn test_used_features_of_parsed_query() {
    let ast = parse("SELECT LOWER(a) FROM t WHERE b ILIKE 'x%' AND c ILIKE 'y%'").unwrap();
    let features = used_features(&ast, ast.root().unwrap());
    assert_eq!(features, vec![LOWER.clone(), ILIKE.clone()]);
}

#[test]
fn test_extracted_subquery_stands_alone() {
    let ast = parse("SELECT a FROM (SELECT a FROM t WHERE a > 1) AS s").unwrap();
    let inner = nested_queries(&ast, ast.root().unwrap())[0];
    let extracted = ast.extract(inner).unwrap();
    assert_eq!(extracted.to_adql(), "SELECT a FROM t WHERE a > 1");
    // The source tree is untouched
    assert_eq!(ast.to_adql(), "SELECT a FROM (SELECT a FROM t WHERE a > 1) AS s");
}
