//! Tests for parse errors and their positions
//!
//! Covers:
//! - Syntax errors and expected-token lists
//! - Qualified names where only a bare column is allowed
//! - Lexical errors surfacing through the parser
//! - Type and arity checks
//! - Unsupported language features and user-defined functions

use adql_ast::{AdqlVersion, FeatureSet, FunctionDef, ILIKE, LOWER, NodeKind};
use adql_diagnostics::*;
use adql_parser::{AdqlParser, parse};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn syntax_error(query: &str) -> SyntaxError {
    match parse(query) {
        Err(ParseError::Syntax(error)) => error,
        other => panic!("expected a syntax error for {query:?}, got {other:?}"),
    }
}

fn parser_without(features: &[&adql_ast::LanguageFeature]) -> AdqlParser {
    let mut set = FeatureSet::for_version(AdqlVersion::V2_1);
    for feature in features {
        set.unsupport(feature);
    }
    AdqlParser::with_features(AdqlVersion::V2_1, set)
}

// === Syntax ===

#[test]
fn test_missing_from() {
    let err = syntax_error("SELECT a");
    assert_eq!(err.code, ADQL0002);
    insta::assert_snapshot!(err.message, @"Unexpected end of query. Was expecting one of: ,, FROM");
}

#[test]
fn test_unexpected_token() {
    let err = syntax_error("SELECT a FROM t WHERE a = 1 b = 2");
    assert_eq!(err.code, ADQL0001);
    assert_eq!(err.found.as_deref(), Some("b"));
    assert_eq!(err.position, TextPosition::new(1, 29, 1, 30));
}

#[test]
fn test_second_order_by_on_parenthesised_query() {
    let err = syntax_error("(SELECT a FROM t ORDER BY a) ORDER BY a");
    assert_eq!(err.code, ADQL0001);
    assert_eq!(err.position.begin_column, 30);
}

#[test]
fn test_subquery_in_from_needs_alias() {
    let err = syntax_error("SELECT * FROM (SELECT a FROM t)");
    assert_eq!(err.code, ADQL0014);
}

#[test]
fn test_natural_join_takes_no_condition() {
    let err = syntax_error("SELECT * FROM a NATURAL JOIN b ON a.x = b.x");
    assert_eq!(err.found.as_deref(), Some("ON"));
}

#[test]
fn test_top_needs_unsigned_integer() {
    let err = syntax_error("SELECT TOP -1 a FROM t");
    assert_eq!(err.code, ADQL0013);
}

// === Qualified names ===

#[rstest]
#[case::order_by("SELECT a FROM t ORDER BY t.col", 27, &[",", "ASC", "DESC"])]
#[case::group_by("SELECT a FROM t GROUP BY t.col", 27, &[",", "HAVING", "ORDER"])]
#[case::using("SELECT * FROM a JOIN b USING (a.id)", 32, &[",", ")"])]
fn test_qualified_name_rejected_at_dot(
    #[case] query: &str,
    #[case] column: u32,
    #[case] expected: &[&str],
) {
    for version in [AdqlVersion::V2_0, AdqlVersion::V2_1] {
        let err = match AdqlParser::new(version).parse_query(query) {
            Err(ParseError::Syntax(error)) => error,
            other => panic!("expected a syntax error, got {other:?}"),
        };
        assert_eq!(err.found.as_deref(), Some("."));
        assert_eq!(err.position, TextPosition::single(1, column));
        assert_eq!(err.expected, expected);
    }
}

// === Identifiers ===

#[rstest]
#[case("SELECT date FROM t", ADQL0008, TextPosition::new(1, 8, 1, 12))]
#[case("SELECT a FROM public.t", ADQL0008, TextPosition::new(1, 15, 1, 21))]
#[case("SELECT _bar FROM t", ADQL0009, TextPosition::new(1, 8, 1, 12))]
#[case("SELECT 2mass FROM t", ADQL0009, TextPosition::new(1, 8, 1, 13))]
#[case("SELECT point FROM t", ADQL0008, TextPosition::new(1, 8, 1, 13))]
#[case("SELECT * FROM catalogs.2mass_psc", ADQL0009, TextPosition::new(1, 24, 1, 33))]
fn test_bad_identifiers(
    #[case] query: &str,
    #[case] code: ErrorCode,
    #[case] position: TextPosition,
) {
    let err = syntax_error(query);
    assert_eq!(err.code, code);
    assert_eq!(err.position, position);
    assert!(err.message.contains("double quotes"), "{}", err.message);
}

#[test]
fn test_reserved_word_message() {
    let err = syntax_error("SELECT year FROM t");
    insta::assert_snapshot!(err.message, @r#""year" is a SQL reserved word and cannot be used as identifier! Put it between double quotes: "year""#);
}

// === Lexical errors ===

#[rstest]
#[case("SELECT a FROM t WHERE a = 'x", ADQL0004)]
#[case("SELECT a ? b FROM t", ADQL0003)]
#[case("SELECT \"a FROM t", ADQL0005)]
fn test_lexical_errors_surface(#[case] query: &str, #[case] code: ErrorCode) {
    match parse(query) {
        Err(ParseError::Lexical(error)) => assert_eq!(error.code, code),
        other => panic!("expected a lexical error, got {other:?}"),
    }
}

// === Types and arity ===

#[rstest]
#[case("SELECT ABS('x') FROM t", TextPosition::new(1, 12, 1, 15))]
#[case("SELECT 'a' + 1 FROM t", TextPosition::new(1, 8, 1, 11))]
#[case("SELECT a FROM t WHERE 1 LIKE 'x%'", TextPosition::new(1, 23, 1, 24))]
#[case("SELECT CONTAINS(1, 2) FROM t", TextPosition::new(1, 17, 1, 18))]
fn test_type_mismatch(#[case] query: &str, #[case] position: TextPosition) {
    let err = syntax_error(query);
    assert_eq!(err.code, ADQL0012);
    assert_eq!(err.position, position);
}

#[test]
fn test_incompatible_comparison() {
    let err = syntax_error("SELECT a FROM t WHERE 'x' = 1");
    assert_eq!(err.code, ADQL0012);
}

#[rstest]
#[case("SELECT ABS(1, 2) FROM t")]
#[case("SELECT PI(1) FROM t")]
#[case("SELECT POINT(1) FROM t")]
#[case("SELECT POLYGON(POINT(0, 0), POINT(1, 1)) FROM t")]
#[case("SELECT LOWER() FROM t")]
#[case("SELECT COALESCE() FROM t")]
fn test_wrong_argument_count(#[case] query: &str) {
    assert_eq!(syntax_error(query).code, ADQL0011);
}

#[test]
fn test_arity_message() {
    let err = syntax_error("SELECT ROUND(1, 2, 3) FROM t");
    insta::assert_snapshot!(err.message, @"Wrong number of arguments for ROUND: expected 1 to 2, found 3");
}

// === Optional features ===

#[test]
fn test_unsupported_feature_is_unresolved_not_syntax() {
    let parser = parser_without(&[&LOWER]);
    let err = parser
        .parse_query("SELECT LOWER(name) FROM t")
        .unwrap_err();
    let ParseError::Unresolved(unresolved) = err else {
        panic!("expected an unresolved-feature error, got {err:?}");
    };
    assert_eq!(unresolved.len(), 1);
    let error = &unresolved.errors[0];
    assert_eq!(error.code, ADQL0100);
    assert_eq!(error.position, Some(TextPosition::new(1, 8, 1, 13)));
    insta::assert_snapshot!(error.message, @r#"Unsupported ADQL feature: "LOWER" (of type 'ivo://ivoa.net/std/TAPRegExt#features-adql-string')!"#);
}

#[test]
fn test_every_unsupported_use_is_reported() {
    let parser = parser_without(&[&LOWER, &ILIKE]);
    let err = parser
        .parse_query("SELECT LOWER(a), LOWER(b) FROM t WHERE a ILIKE 'x'")
        .unwrap_err();
    let positions: Vec<_> = match &err {
        ParseError::Unresolved(e) => e.iter().map(|e| e.position).collect(),
        other => panic!("expected an unresolved-feature error, got {other:?}"),
    };
    assert_eq!(
        positions,
        vec![
            Some(TextPosition::new(1, 8, 1, 13)),
            Some(TextPosition::new(1, 18, 1, 23)),
            Some(TextPosition::new(1, 42, 1, 47)),
        ]
    );
}

#[test]
fn test_syntax_error_wins_over_unsupported_feature() {
    let parser = parser_without(&[&LOWER]);
    let err = parser.parse_query("SELECT LOWER(a) FROM").unwrap_err();
    assert!(matches!(err, ParseError::Syntax(_)));
}

#[test]
fn test_supported_again_after_support() {
    let mut parser = parser_without(&[&LOWER]);
    assert!(parser.parse_query("SELECT LOWER(a) FROM t").is_err());
    parser.features_mut().support(&LOWER);
    assert!(parser.parse_query("SELECT LOWER(a) FROM t").is_ok());
}

// === User-defined functions ===

#[test]
fn test_any_udf_allowed_by_default() {
    let ast = parse("SELECT my_func(a, 1) FROM t").unwrap();
    assert_eq!(ast.to_adql(), "SELECT my_func(a, 1) FROM t");
}

#[test]
fn test_undeclared_udf() {
    let mut parser = AdqlParser::default();
    parser.features_mut().allow_any_udf(false);
    let err = parser.parse_query("SELECT foo(a) FROM t").unwrap_err();
    assert_eq!(err.code(), ADQL0101);
    assert_eq!(err.position(), Some(TextPosition::new(1, 8, 1, 14)));
}

#[test]
fn test_declared_udf_is_resolved() {
    let mut parser = AdqlParser::default();
    parser.features_mut().allow_any_udf(false);
    let definition = FunctionDef::parse("foo(x DOUBLE) -> DOUBLE").unwrap();
    parser.features_mut().support_udf(definition.clone());

    let ast = parser.parse_query("SELECT foo(a) FROM t").unwrap();
    let call = ast
        .descendants(ast.root().unwrap())
        .into_iter()
        .find(|&id| matches!(ast.kind(id), NodeKind::UserFunction(_)))
        .unwrap();
    match ast.kind(call) {
        NodeKind::UserFunction(udf) => assert_eq!(udf.definition.as_ref(), Some(&definition)),
        _ => unreachable!(),
    }
    assert!(ast.is_numeric(call));
    assert!(!ast.is_string(call));

    // Wrong arity does not match the declaration
    assert_eq!(
        parser.parse_query("SELECT foo(a, 2) FROM t").unwrap_err().code(),
        ADQL0101
    );
    // Declared parameter types are checked
    assert_eq!(
        parser.parse_query("SELECT foo('x') FROM t").unwrap_err().code(),
        ADQL0012
    );
}

#[test]
fn test_digit_name_part_hint_names_only_that_part() {
    let err = syntax_error("SELECT * FROM catalogs.2mass_psc");
    insta::assert_snapshot!(err.message, @r#"Invalid ADQL regular identifier: "2mass_psc"! If it is a column/table name, put it between double quotes: "2mass_psc""#);
}
