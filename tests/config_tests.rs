use sheetql_core::{ContainsMatching, FileVersion, TranslatorConfig};
use std::io::Write;

#[test]
fn test_toml_round_trip() {
    let config = TranslatorConfig {
        file_version: Some(FileVersion::Excel2007),
        contains_matching: ContainsMatching::CaseSensitive,
        trim_text: true,
    };
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("file_version = \"excel_2007\""));
    assert_eq!(TranslatorConfig::from_str(&text).unwrap(), config);
}

#[test]
fn test_json_round_trip() {
    let config = TranslatorConfig {
        file_version: Some(FileVersion::Csv),
        contains_matching: ContainsMatching::CaseInsensitive,
        trim_text: false,
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(TranslatorConfig::from_str(&json).unwrap(), config);
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "contains_matching = \"case_insensitive\"").unwrap();
    let config = TranslatorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.contains_matching, ContainsMatching::CaseInsensitive);
    assert_eq!(config.file_version, None);
}

#[test]
fn test_from_missing_file_is_io_error() {
    let result = TranslatorConfig::from_file("/nonexistent/sheetql.toml");
    assert!(matches!(result, Err(sheetql_core::Error::Io(_))));
}

#[test]
fn test_from_env() {
    std::env::set_var("SHEETQL_FILE_VERSION", "xls");
    std::env::set_var("SHEETQL_CONTAINS_MATCHING", "case_sensitive");
    std::env::set_var("SHEETQL_TRIM_TEXT", "true");
    let config = TranslatorConfig::from_env().unwrap();
    std::env::remove_var("SHEETQL_FILE_VERSION");
    std::env::remove_var("SHEETQL_CONTAINS_MATCHING");
    std::env::remove_var("SHEETQL_TRIM_TEXT");

    assert_eq!(config.file_version, Some(FileVersion::PreExcel2007));
    assert_eq!(config.contains_matching, ContainsMatching::CaseSensitive);
    assert!(config.trim_text);
}

#[test]
fn test_file_version_detection() {
    use std::path::Path;
    assert_eq!(FileVersion::from_path(Path::new("a/b.CSV")).unwrap(), FileVersion::Csv);
    assert_eq!(FileVersion::from_path(Path::new("b.xls")).unwrap(), FileVersion::PreExcel2007);
    assert_eq!(FileVersion::from_path(Path::new("b.xlsm")).unwrap(), FileVersion::Excel2007);
    assert!(FileVersion::from_path(Path::new("README")).is_err());
}
