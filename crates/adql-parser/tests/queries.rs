//! Tests for parsing and rendering complete queries
//!
//! Covers:
//! - Canonical rendering of every clause
//! - Joins, subqueries and set operations
//! - Functions and operators
//! - Clause-level entry points
//! - Differences between ADQL 2.0 and 2.1

use adql_ast::{AdqlVersion, Ast, NodeKind};
use adql_diagnostics::TextPosition;
use adql_parser::{AdqlParser, parse};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn parse_ok(query: &str) -> Ast {
    parse(query).unwrap_or_else(|e| panic!("Failed to parse {query:?}: {e}"))
}

fn canonical(query: &str) -> String {
    parse_ok(query).to_adql()
}

// === Round trip ===

#[rstest]
#[case("SELECT * FROM t", "SELECT * FROM t")]
#[case(
    "select a, b as x from t where a = 1 and b < 2 or c is null",
    "SELECT a, b AS x FROM t WHERE a = 1 AND b < 2 OR c IS NULL"
)]
#[case(
    "SELECT DISTINCT TOP 5 t.a FROM sch.t AS t ORDER BY 1 DESC, a ASC",
    "SELECT DISTINCT TOP 5 t.a FROM sch.t AS t ORDER BY 1 DESC, a"
)]
#[case("SELECT t.*, u.x FROM t, u", "SELECT t.*, u.x FROM t, u")]
#[case(
    "SELECT * FROM a JOIN b ON a.id = b.id",
    "SELECT * FROM a INNER JOIN b ON a.id = b.id"
)]
#[case(
    "SELECT * FROM a natural left join b",
    "SELECT * FROM a NATURAL LEFT OUTER JOIN b"
)]
#[case(
    "SELECT * FROM a FULL JOIN b USING (id, x)",
    "SELECT * FROM a FULL OUTER JOIN b USING (id, x)"
)]
#[case("SELECT * FROM a, b, c", "SELECT * FROM a, b, c")]
#[case(
    "SELECT * FROM a, b JOIN c ON b.x = c.x",
    "SELECT * FROM a, (b INNER JOIN c ON b.x = c.x)"
)]
#[case(
    "SELECT COUNT(*), AVG(DISTINCT mag) FROM t GROUP BY kind HAVING COUNT(*) > 1",
    "SELECT COUNT(*), AVG(DISTINCT mag) FROM t GROUP BY kind HAVING COUNT(*) > 1"
)]
#[case(
    "SELECT a FROM t WHERE a NOT BETWEEN 1 AND 2 AND b NOT IN (1, 2, 3) AND c NOT LIKE 'x%'",
    "SELECT a FROM t WHERE a NOT BETWEEN 1 AND 2 AND b NOT IN (1, 2, 3) AND c NOT LIKE 'x%'"
)]
#[case(
    "SELECT a FROM t WHERE NOT (a = 1 OR b = 2) AND c IS NOT NULL",
    "SELECT a FROM t WHERE NOT (a = 1 OR b = 2) AND c IS NOT NULL"
)]
#[case(
    "SELECT a FROM t WHERE EXISTS (SELECT b FROM u WHERE u.b = t.a)",
    "SELECT a FROM t WHERE EXISTS(SELECT b FROM u WHERE u.b = t.a)"
)]
#[case(
    "SELECT a FROM t WHERE a IN (SELECT b FROM u)",
    "SELECT a FROM t WHERE a IN (SELECT b FROM u)"
)]
#[case("SELECT x.a FROM (SELECT a FROM t) AS x", "SELECT x.a FROM (SELECT a FROM t) AS x")]
#[case("SELECT -a, - -1, a * (b + 2) / 3 FROM t", "SELECT -a, - -1, a * (b + 2) / 3 FROM t")]
#[case("SELECT 'a' || b || 'c' FROM t", "SELECT 'a' || b || 'c' FROM t")]
#[case(
    "SELECT CONTAINS(POINT('ICRS', ra, de), CIRCLE('ICRS', 10, 20, 1)) FROM t",
    "SELECT CONTAINS(POINT('ICRS', ra, de), CIRCLE('ICRS', 10, 20, 1)) FROM t"
)]
#[case(
    "SELECT DISTANCE(POINT(ra, de), POINT(1.5, -2e3)) AS d FROM t",
    "SELECT DISTANCE(POINT(ra, de), POINT(1.5, -2e3)) AS d FROM t"
)]
#[case(
    "SELECT \"my col\", \"Sel\"\"ect\" FROM \"my table\"",
    "SELECT \"my col\", \"Sel\"\"ect\" FROM \"my table\""
)]
#[case("SELECT 'it''s' FROM t;", "SELECT 'it''s' FROM t")]
fn test_round_trip(#[case] query: &str, #[case] expected: &str) {
    let rendered = canonical(query);
    assert_eq!(rendered, expected);
    // Rendering is a fixed point
    assert_eq!(canonical(&rendered), rendered);
}

#[test]
fn test_adjacent_strings_are_one_literal() {
    let ast = AdqlParser::default().parse_operand("'a' 'b'\n 'c'").unwrap();
    let root = ast.root().unwrap();
    match ast.kind(root) {
        NodeKind::Text(text) => assert_eq!(text.value, "abc"),
        other => panic!("expected a string literal, got {other:?}"),
    }
    assert_eq!(ast.to_adql(), "'abc'");
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(
        canonical("SeLeCt Abs(x) FrOm t WhErE x iS nUlL"),
        "SELECT ABS(x) FROM t WHERE x IS NULL"
    );
}

#[test]
fn test_comments_are_ignored() {
    assert_eq!(
        canonical("SELECT a -- the a column\nFROM t -- all rows"),
        "SELECT a FROM t"
    );
}

// === ADQL 2.1 ===

#[rstest]
#[case(
    "SELECT a FROM t UNION SELECT a FROM u",
    "SELECT a FROM t UNION SELECT a FROM u"
)]
#[case(
    "SELECT a FROM t UNION ALL SELECT a FROM u INTERSECT SELECT a FROM v",
    "SELECT a FROM t UNION ALL (SELECT a FROM u INTERSECT SELECT a FROM v)"
)]
#[case(
    "(SELECT a FROM t EXCEPT SELECT a FROM u) INTERSECT SELECT a FROM v",
    "(SELECT a FROM t EXCEPT SELECT a FROM u) INTERSECT SELECT a FROM v"
)]
#[case(
    "SELECT a FROM t UNION SELECT a FROM u ORDER BY a OFFSET 10",
    "SELECT a FROM t UNION SELECT a FROM u ORDER BY a OFFSET 10"
)]
#[case(
    "WITH near(id) AS (SELECT id FROM t WHERE d < 1) SELECT * FROM near",
    "WITH near(id) AS (SELECT id FROM t WHERE d < 1) SELECT * FROM near"
)]
#[case(
    "SELECT LOWER(name), UPPER('x') FROM t WHERE name ILIKE 'm%'",
    "SELECT LOWER(name), UPPER('x') FROM t WHERE name ILIKE 'm%'"
)]
#[case(
    "SELECT COALESCE(a, b, 0), CAST(a AS double precision), CAST(b AS varchar(10)) FROM t",
    "SELECT COALESCE(a, b, 0), CAST(a AS DOUBLE PRECISION), CAST(b AS VARCHAR(10)) FROM t"
)]
#[case(
    "SELECT IN_UNIT(dist, 'pc'), a & 0xFF | b ^ ~c FROM t",
    "SELECT IN_UNIT(dist, 'pc'), a & 0xFF | b ^ ~c FROM t"
)]
#[case(
    "SELECT a FROM t ORDER BY a * 2 DESC OFFSET 5",
    "SELECT a FROM t ORDER BY a * 2 DESC OFFSET 5"
)]
#[case(
    "SELECT CIRCLE(POINT(1, 2), 3), POLYGON(POINT(0, 0), POINT(1, 0), POINT(0, 1)) FROM t",
    "SELECT CIRCLE(POINT(1, 2), 3), POLYGON(POINT(0, 0), POINT(1, 0), POINT(0, 1)) FROM t"
)]
fn test_round_trip_2_1(#[case] query: &str, #[case] expected: &str) {
    let rendered = canonical(query);
    assert_eq!(rendered, expected);
    assert_eq!(canonical(&rendered), rendered);
}

#[test]
fn test_hexadecimal_top_and_offset() {
    assert_eq!(
        canonical("SELECT TOP 0x10 a FROM t OFFSET 0X0a"),
        "SELECT TOP 16 a FROM t OFFSET 10"
    );
}

#[test]
fn test_order_by_attaches_to_outermost_query() {
    let ast = parse_ok("SELECT a FROM t UNION SELECT a FROM u ORDER BY a");
    let root = ast.root().unwrap();
    assert!(matches!(ast.kind(root), NodeKind::SetOperation(_)));
    let order_by = ast.children(root)[3];
    assert_eq!(ast.children(order_by).len(), 1);
}

#[rstest]
#[case("SELECT a FROM t OFFSET 1")]
#[case("SELECT a FROM t UNION SELECT b FROM u")]
#[case("SELECT LOWER(a) FROM t")]
#[case("SELECT a FROM t WHERE a ILIKE 'x'")]
#[case("SELECT 0x1F FROM t")]
#[case("SELECT a & 1 FROM t")]
#[case("WITH x AS (SELECT a FROM t) SELECT * FROM x")]
#[case("SELECT a FROM t ORDER BY a + 1")]
#[case("SELECT CIRCLE(POINT('ICRS', 1, 2), 3) FROM t")]
fn test_2_1_syntax_rejected_in_2_0(#[case] query: &str) {
    assert!(AdqlParser::new(AdqlVersion::V2_1).parse_query(query).is_ok());
    assert!(AdqlParser::new(AdqlVersion::V2_0).parse_query(query).is_err());
}

#[test]
fn test_2_0_requires_coordinate_system() {
    let parser = AdqlParser::new(AdqlVersion::V2_0);
    let ast = parser
        .parse_query("SELECT POINT('ICRS', ra, de) FROM t")
        .unwrap();
    assert_eq!(ast.to_adql(), "SELECT POINT('ICRS', ra, de) FROM t");
    assert!(parser.parse_query("SELECT POINT(ra, de) FROM t").is_err());
}

// === Positions ===

#[test]
fn test_node_positions() {
    let ast = parse_ok("SELECT a,\n  ABS(b)\nFROM t");
    let root = ast.root().unwrap();
    assert_eq!(ast.position(root), Some(TextPosition::new(1, 1, 3, 7)));

    let clause = ast.children(root)[1];
    let second_item = ast.children(clause)[1];
    assert_eq!(ast.position(second_item), Some(TextPosition::new(2, 3, 2, 9)));
}

// === Entry points ===

#[rstest]
#[case::select("SELECT TOP 3 a AS x, *", "SELECT TOP 3 a AS x, *")]
#[case::from("FROM a JOIN b USING (id)", "a INNER JOIN b USING (id)")]
#[case::filter("WHERE a > 1 OR b < 2", "a > 1 OR b < 2")]
#[case::group_by("GROUP BY a, 2", "a, 2")]
#[case::having("HAVING COUNT(*) > 3", "COUNT(*) > 3")]
#[case::order_by("ORDER BY a DESC, b", "a DESC, b")]
#[case::operand("1 + ABS(x)", "1 + ABS(x)")]
fn test_clause_entry_points(#[case] text: &str, #[case] expected: &str) {
    let parser = AdqlParser::default();
    let ast = match text.split_whitespace().next() {
        Some("SELECT") => parser.parse_select(text),
        Some("FROM") => parser.parse_from(text),
        Some("WHERE") => parser.parse_where(text),
        Some("GROUP") => parser.parse_group_by(text),
        Some("HAVING") => parser.parse_having(text),
        Some("ORDER") => parser.parse_order_by(text),
        _ => parser.parse_operand(text),
    }
    .unwrap();
    assert_eq!(ast.to_adql(), expected);
}

#[test]
fn test_entry_point_rejects_trailing_input() {
    let err = AdqlParser::default().parse_where("WHERE a = 1 FROM t").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"Encountered "FROM". Was expecting: <EOF> (line 1, columns 13-17)"#);
}

#[test]
fn test_tokenize() {
    let tokens = AdqlParser::default().tokenize("SELECT a FROM t").unwrap();
    let images: Vec<_> = tokens.iter().map(|t| t.image).collect();
    assert_eq!(images, vec!["SELECT", "a", "FROM", "t", ""]);
}
