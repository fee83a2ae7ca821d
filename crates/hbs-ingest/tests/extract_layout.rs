use std::fs;
use std::path::Path;

use hbs_config::{DEFAULT_SETTINGS, DataLayout, SettingsStore};
use hbs_ingest::{CsvExtractSource, ParquetSink, RawTableSource, TableSink, read_parquet_table};

fn layout(root: &Path) -> DataLayout {
    let settings =
        SettingsStore::from_sources(DEFAULT_SETTINGS, None, None, root, root).expect("settings");
    DataLayout::from_settings(&settings).expect("layout")
}

#[test]
fn reads_extracts_and_writes_cleaned_tables_under_the_layout() {
    let root = tempfile::tempdir().expect("root dir");
    let layout = layout(root.path());
    let year_dir = layout.extracted_year_dir(1390);
    fs::create_dir_all(&year_dir).unwrap();
    fs::write(year_dir.join("P1.csv"), "ADDRESS,DYCOL03\n10001,1\n10002,2\n").unwrap();

    let source = CsvExtractSource::from_layout(&layout);
    let mut df = source.load(1390, "P1").unwrap();
    assert_eq!(df.shape(), (2, 2));

    let mut sink = ParquetSink::from_layout(&layout);
    sink.write("members", 1390, &mut df).unwrap();
    let written = layout.cleaned_data.join("1390_members.parquet");
    assert!(written.is_file());
    assert!(read_parquet_table(&written).unwrap().equals(&df));
}
