use std::path::Path;

use super::*;

#[test]
fn encoding_labels_round_trip() {
    for encoding in [
        Encoding::Utf8,
        Encoding::Utf16Le,
        Encoding::Utf16Be,
        Encoding::Latin1,
    ] {
        let parsed = Encoding::parse(encoding.as_str()).expect("label must parse");
        assert_eq!(parsed, encoding);
    }
}

#[test]
fn encoding_parse_is_case_insensitive() {
    assert_eq!(
        Encoding::parse("UTF-8").expect("must parse"),
        Encoding::Utf8
    );
    assert_eq!(
        Encoding::parse("Latin1").expect("must parse"),
        Encoding::Latin1
    );
}

#[test]
fn encoding_parse_rejects_unknown_label() {
    let err = Encoding::parse("ebcdic").expect_err("must reject");
    assert!(err.to_string().contains("unsupported output encoding"));
}

#[test]
fn parse_writer_config() {
    let content = r#"
media_type = "text/html"
encoding = "utf-16le"
indent = true
"#;
    let config = WriterConfig::from_toml_str(content).expect("config should parse");
    assert_eq!(config.media_type, "text/html");
    assert_eq!(config.encoding, Encoding::Utf16Le);
    assert!(config.indent);
}

#[test]
fn parse_writer_config_applies_defaults() {
    let config = WriterConfig::from_toml_str("").expect("empty config should parse");
    assert_eq!(config, WriterConfig::default());
    assert_eq!(config.media_type, "application/xml");
    assert_eq!(config.encoding, Encoding::Utf8);
    assert!(!config.indent);
}

#[test]
fn parse_writer_config_rejects_bare_media_type() {
    let err = WriterConfig::from_toml_str("media_type = \"xml\"\n")
        .expect_err("media type without subtype should be rejected");
    assert!(format!("{err:#}").contains("type/subtype"));
}

#[test]
fn parse_writer_config_rejects_media_type_with_spaces() {
    let err = WriterConfig::from_toml_str("media_type = \"text/plain charset\"\n")
        .expect_err("media type with spaces should be rejected");
    assert!(format!("{err:#}").contains("invalid character"));
}

#[test]
fn parse_writer_config_rejects_unknown_encoding_label() {
    let err = WriterConfig::from_toml_str("encoding = \"ebcdic\"\n")
        .expect_err("unknown encoding label should be rejected");
    assert!(format!("{err:#}").contains("failed to parse writer configuration"));
}

#[test]
fn scheme_detection() {
    assert_eq!(parse_scheme("http://example.test/out.xml"), Some("http"));
    assert_eq!(parse_scheme("file:///runs/out.xml"), Some("file"));
    assert_eq!(parse_scheme("urn:isbn:0451450523"), Some("urn"));
    assert_eq!(parse_scheme("report.xml"), None);
    assert_eq!(parse_scheme("reports/summary.xml"), None);
}

#[test]
fn drive_letters_are_not_schemes() {
    assert_eq!(parse_scheme("C:\\runs\\out.xml"), None);
    assert_eq!(parse_scheme("c:/runs/out.xml"), None);
}

#[test]
fn scheme_must_start_alphabetic() {
    assert_eq!(parse_scheme("1ab:out.xml"), None);
    assert_eq!(parse_scheme("a b:out.xml"), None);
}

#[test]
fn resolve_relative_identifier_lands_next_to_base() {
    let resolved = resolve_output_location(Path::new("/runs/out.xml"), "report.xml")
        .expect("must resolve");
    assert_eq!(
        resolved,
        ResolvedLocation::File(Path::new("/runs/report.xml").to_path_buf())
    );
}

#[test]
fn resolve_relative_identifier_with_subdirectory() {
    let resolved = resolve_output_location(Path::new("/runs/out.xml"), "chapters/one.xml")
        .expect("must resolve");
    assert_eq!(
        resolved,
        ResolvedLocation::File(Path::new("/runs/chapters/one.xml").to_path_buf())
    );
}

#[test]
fn resolve_folds_parent_components() {
    let resolved = resolve_output_location(Path::new("/runs/out.xml"), "../archive/report.xml")
        .expect("must resolve");
    assert_eq!(
        resolved,
        ResolvedLocation::File(Path::new("/archive/report.xml").to_path_buf())
    );
}

#[test]
fn resolve_absolute_identifier_passes_through() {
    let resolved = resolve_output_location(Path::new("/runs/out.xml"), "/elsewhere/report.xml")
        .expect("must resolve");
    assert_eq!(
        resolved,
        ResolvedLocation::File(Path::new("/elsewhere/report.xml").to_path_buf())
    );
}

#[test]
fn resolve_file_uri() {
    let resolved = resolve_output_location(Path::new("/runs/out.xml"), "file:///data/report.xml")
        .expect("must resolve");
    assert_eq!(
        resolved,
        ResolvedLocation::File(Path::new("/data/report.xml").to_path_buf())
    );
}

#[test]
fn resolve_file_uri_with_localhost() {
    let resolved =
        resolve_output_location(Path::new("/runs/out.xml"), "file://localhost/data/report.xml")
            .expect("must resolve");
    assert_eq!(
        resolved,
        ResolvedLocation::File(Path::new("/data/report.xml").to_path_buf())
    );
}

#[test]
fn resolve_file_uri_rejects_remote_host() {
    let err = resolve_output_location(Path::new("/runs/out.xml"), "file://nas/data/report.xml")
        .expect_err("remote file host should be rejected");
    assert!(err.to_string().contains("non-local host"));
}

#[test]
fn resolve_reports_unsupported_scheme() {
    let resolved = resolve_output_location(Path::new("/runs/out.xml"), "http://example.test/a.xml")
        .expect("must resolve");
    assert_eq!(
        resolved,
        ResolvedLocation::Unsupported {
            scheme: "http".to_string()
        }
    );
}

#[test]
fn resolve_rejects_empty_identifier() {
    let err = resolve_output_location(Path::new("/runs/out.xml"), "  ")
        .expect_err("empty identifier should be rejected");
    assert!(err.to_string().contains("must not be empty"));
}

#[test]
fn normalize_path_folds_dot_components() {
    assert_eq!(
        normalize_path(Path::new("/runs/./a/../report.xml")),
        Path::new("/runs/report.xml")
    );
}

#[test]
fn normalize_path_keeps_leading_parent_components() {
    assert_eq!(
        normalize_path(Path::new("../report.xml")),
        Path::new("../report.xml")
    );
}

#[test]
fn diagnostic_display_includes_source() {
    let diagnostic = Diagnostic::warning("unsupported destination").with_source("http://x/a.xml");
    assert_eq!(
        diagnostic.to_string(),
        "warning: unsupported destination (http://x/a.xml)"
    );
}

#[test]
fn collected_diagnostics_keep_report_order() {
    let sink = CollectedDiagnostics::new();
    assert!(sink.is_empty());

    sink.report(Diagnostic::warning("first"));
    sink.report(Diagnostic::error("second"));

    let entries = sink.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message, "first");
    assert_eq!(entries[1].severity, Severity::Error);
    assert!(sink.has_errors());
}

#[test]
fn collected_diagnostics_without_errors() {
    let sink = CollectedDiagnostics::new();
    sink.report(Diagnostic::new(Severity::Info, "note"));
    assert!(!sink.has_errors());
}
