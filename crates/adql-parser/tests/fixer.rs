//! Tests for the query fixer

use adql_ast::AdqlVersion;
use adql_diagnostics::{ADQL0003, ParseError};
use adql_parser::{AdqlParser, QueryFixer, parse};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case("SELECT _bar FROM aTable", "SELECT \"_bar\" FROM aTable")]
#[case(
    "SELECT date, year, user FROM public.aTable",
    "SELECT \"date\", \"year\", \"user\" FROM \"public\".aTable"
)]
#[case("SELECT \u{FF3F}bar FROM aTable", "SELECT \"_bar\" FROM aTable")]
#[case("SELECT \u{2017}bar FROM aTable", "SELECT \"_bar\" FROM aTable")]
#[case(
    "SELECT a FROM t WHERE b = \u{2018}x\u{2019} AND c \u{2013} 1 > 0",
    "SELECT a FROM t WHERE b = 'x' AND c - 1 > 0"
)]
#[case("SELECT 2mass, region FROM t", "SELECT \"2mass\", \"region\" FROM t")]
#[case("SELECT \"date\" FROM t", "SELECT \"date\" FROM t")]
#[case("SELECT * FROM catalogs.2mass_psc", "SELECT * FROM catalogs.\"2mass_psc\"")]
#[case("SELECT t.2mass, .5 FROM t", "SELECT t.\"2mass\", .5 FROM t")]
fn test_fix(#[case] query: &str, #[case] expected: &str) {
    assert_eq!(QueryFixer::default().fix(query).unwrap(), expected);
}

#[test]
fn test_fixed_digit_name_part_keeps_its_table() {
    let fixed = QueryFixer::default()
        .fix("SELECT * FROM catalogs.2mass_psc")
        .unwrap();
    assert_eq!(
        parse(&fixed).unwrap().to_adql(),
        "SELECT * FROM catalogs.\"2mass_psc\""
    );
}

#[test]
fn test_fixed_query_parses() {
    let fixed = AdqlParser::default()
        .fix_query("SELECT date, _id\tFROM public.aTable\r\nWHERE year > 2000")
        .unwrap();
    assert_eq!(
        fixed,
        "SELECT \"date\", \"_id\"    FROM \"public\".aTable\nWHERE \"year\" > 2000"
    );
    assert_eq!(
        parse(&fixed).unwrap().to_adql(),
        "SELECT \"date\", \"_id\" FROM \"public\".aTable WHERE \"year\" > 2000"
    );
}

#[test]
fn test_version_decides_what_is_reserved() {
    // LOWER is a function in 2.1 but only an SQL word in 2.0
    let query = "SELECT LOWER(a) FROM t";
    assert_eq!(QueryFixer::new(AdqlVersion::V2_1).fix(query).unwrap(), query);
    assert_eq!(
        QueryFixer::new(AdqlVersion::V2_0).fix(query).unwrap(),
        "SELECT \"LOWER\"(a) FROM t"
    );
}

#[test]
fn test_lexical_error_aborts_fix() {
    let err = QueryFixer::default().fix("SELECT a ? b FROM t").unwrap_err();
    assert!(matches!(err, ParseError::Lexical(ref e) if e.code == ADQL0003));
}

fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "SELECT", "FROM", "WHERE", "date", "_bar", "aTable", "point", "POINT(1, 2)", ",", "=",
        "\t", "\r\n", "public.t", "\u{FF3F}x", "2mass", "'str'", "\"quoted\"", "x", "\u{00A0}",
        "CAST(a AS INTEGER)", "-- note\n", "\u{201C}id\u{201D}",
    ])
}

proptest! {
    #[test]
    fn prop_fix_is_idempotent(parts in prop::collection::vec(fragment(), 0..12)) {
        let query = parts.join(" ");
        let fixer = QueryFixer::default();
        let once = fixer.fix(&query).unwrap();
        let twice = fixer.fix(&once).unwrap();
        prop_assert_eq!(twice, once);
    }
}
