//! Tests for loading parser configurations and running configured parsers

use adql::diagnostics::*;
use adql::{AdqlVersion, Error, ParserConfig, parse_and_check};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;

const CONFIG: &str = r#"{
    "version": "2.1",
    "allow_any_udf": false,
    "unsupported": ["ILIKE"],
    "udfs": ["gavo_match(pattern VARCHAR, string VARCHAR) -> INTEGER"],
    "tables": [
        {
            "schema": "ivoa",
            "name": "obscore",
            "columns": [
                { "adql_name": "obs_id", "datatype": { "kind": "VARCHAR" } },
                { "adql_name": "s_ra", "datatype": { "kind": "DOUBLE" } }
            ]
        }
    ]
}"#;

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_config_file() {
    let file = write_config(CONFIG);
    let config = ParserConfig::load(file.path()).unwrap();
    assert_eq!(config.version, AdqlVersion::V2_1);
    assert!(!config.allow_any_udf);
    assert_eq!(config.tables.len(), 1);
    assert_eq!(config.tables[0].columns.len(), 2);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ParserConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.code(), ADQL0300);
    assert!(err.to_string().contains("absent.json"));
}

#[rstest]
#[case("SELECT obs_id FROM ivoa.obscore WHERE gavo_match('x%', obs_id) = 1")]
#[case("SELECT TOP 5 s_ra FROM ivoa.obscore WHERE LOWER(obs_id) = 'a'")]
fn test_configured_parser_accepts(#[case] query: &str) {
    let config = ParserConfig::from_json(CONFIG).unwrap();
    let parser = config.build().unwrap();
    let checker = config.checker().unwrap();
    assert!(parse_and_check(&parser, &checker, query).is_ok());
}

#[test]
fn test_unsupported_feature_is_reported() {
    let config = ParserConfig::from_json(CONFIG).unwrap();
    let parser = config.build().unwrap();
    let checker = config.checker().unwrap();
    let err = parse_and_check(
        &parser,
        &checker,
        "SELECT obs_id FROM ivoa.obscore WHERE obs_id ILIKE 'a%'",
    )
    .unwrap_err();
    assert!(matches!(err, Error::Parse(ParseError::Unresolved(_))));
    let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ADQL0100]);
}

#[test]
fn test_undeclared_function_is_reported() {
    let config = ParserConfig::from_json(CONFIG).unwrap();
    let parser = config.build().unwrap();
    let err = parser
        .parse_query("SELECT ivo_hashlist_has(obs_id, 'x') FROM ivoa.obscore")
        .unwrap_err();
    let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ADQL0101]);
}

#[test]
fn test_schema_errors_come_from_the_checker() {
    let config = ParserConfig::from_json(CONFIG).unwrap();
    let parser = config.build().unwrap();
    let checker = config.checker().unwrap();
    let err = parse_and_check(&parser, &checker, "SELECT s_dec FROM ivoa.obscore").unwrap_err();
    assert!(matches!(err, Error::Check(_)));
    insta::assert_snapshot!(err.diagnostics()[0].to_string(), @r#"error: ADQL0103 - Unknown column "s_dec"! at line 1, columns 8-13"#);
}

#[test]
fn test_no_tables_no_checker() {
    assert!(ParserConfig::default().checker().is_none());
}

#[test]
fn test_version_override() {
    let mut config = ParserConfig::from_json(r#"{ "version": "2.1" }"#).unwrap();
    config.set_version("2.0").unwrap();
    let parser = config.build().unwrap();
    assert!(parser.parse_query("SELECT a FROM t OFFSET 10").is_err());
}
