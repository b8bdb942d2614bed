use super::*;

#[test]
fn extension_is_lowercased_suffix_after_last_dot() {
    assert_eq!(file_extension("Report.Final.XLSX"), "xlsx");
    assert_eq!(file_extension("archive.tar.gz"), "gz");
    assert_eq!(file_extension("Makefile"), "makefile");
    assert_eq!(file_extension("trailing."), "");
}

#[test]
fn every_supported_extension_sets_the_source_format() {
    let cases = [
        ("dump.sql", Format::Sql),
        ("book.xlsx", Format::Excel),
        ("legacy.XLS", Format::Excel),
        ("rows.csv", Format::Csv),
        ("doc.json", Format::Json),
        ("store.db", Format::Sqlite),
        ("store.sqlite", Format::Sqlite),
    ];
    for (name, expected) in cases {
        let mut manager = SelectionManager::new(MigrationFormats {
            source: Format::Json,
            target: Format::Csv,
        });
        if expected == Format::Json {
            manager.set_source_format(Format::Sql);
        }
        let selection =
            manager.select_file(SelectedFile::new(name, b"x".to_vec()), SelectionOrigin::Browse);
        assert_eq!(selection.inferred_source_format, Some(expected), "{name}");
        assert_eq!(manager.formats().source, expected, "{name}");
        assert_eq!(manager.formats().target, Format::Csv);
    }
}

#[test]
fn unsupported_extension_keeps_prior_source_format() {
    for name in ["notes.txt", "README", "data.parquet", "noext."] {
        let mut manager = SelectionManager::default();
        manager.set_source_format(Format::Excel);
        let selection =
            manager.select_file(SelectedFile::new(name, Vec::new()), SelectionOrigin::Drop);
        assert_eq!(selection.inferred_source_format, None, "{name}");
        assert_eq!(manager.formats().source, Format::Excel, "{name}");
    }
}

#[test]
fn new_selection_replaces_previous_one() {
    let mut manager = SelectionManager::default();
    assert!(manager.current().is_none());

    manager.select_file(SelectedFile::new("first.csv", b"a".to_vec()), SelectionOrigin::Browse);
    manager.select_file(SelectedFile::new("second.json", b"bb".to_vec()), SelectionOrigin::Drop);

    let current = manager.current().expect("selection");
    assert_eq!(current.file.name, "second.json");
    assert_eq!(current.file.len(), 2);
    assert_eq!(manager.selected_file_name(), Some("second.json"));
}

#[tokio::test]
async fn reads_selected_file_from_disk() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("migrator_selection_{suffix}.csv"));
    std::fs::write(&path, b"id,name\n1,a\n").expect("write");

    let file = SelectedFile::from_path(&path).await.expect("read");
    assert_eq!(file.name, format!("migrator_selection_{suffix}.csv"));
    assert_eq!(file.bytes, b"id,name\n1,a\n");

    std::fs::remove_file(path).expect("cleanup");
}

#[tokio::test]
async fn missing_file_is_a_validation_error() {
    let err = SelectedFile::from_path("/definitely/not/here.csv")
        .await
        .expect_err("missing file");
    assert_eq!(err.kind(), migrator_shared::error::ErrorKind::Validation);
}
