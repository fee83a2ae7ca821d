use std::fs;
use std::path::{Path, PathBuf};

use hbs_clean::ClassificationRequest;
use hbs_cli::{TableForm, Workspace};
use hbs_config::SetupAction;
use hbs_ingest::read_parquet_table;

fn package_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn write_extract(root: &Path, year: u32, file_code: &str, text: &str) {
    let dir = root.join("hbs_data").join("extracted").join(year.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{file_code}.csv")), text).unwrap();
}

fn household_extract(year: u32) -> String {
    format!(
        "ADDRESS,KHAZAR,FASL,MAH,WEIGHT,OSTAN,SHAHRE,INFOSTATUS\n\
         10001,{year},1,4,350.5,23,1,3\n\
         10002,{year},3,9,120,7,2,1\n"
    )
}

fn labels(df: &polars::prelude::DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

#[test]
fn loads_bundled_metadata_against_a_fresh_root() {
    let root = tempfile::tempdir().unwrap();
    let workspace = Workspace::load(&package_dir(), root.path()).unwrap();

    assert_eq!(workspace.layout.local_dir, root.path().join("hbs_data"));
    let tables = workspace.select_tables(&[]).unwrap();
    assert!(tables.contains(&"household_information".to_string()));
    assert!(tables.contains(&"members".to_string()));
    assert_eq!(
        workspace.select_tables(&["members".to_string()]).unwrap(),
        vec!["members".to_string()]
    );
    let err = workspace.select_tables(&["nope".to_string()]).unwrap_err();
    assert!(err.to_string().contains("unknown table 'nope'"));
}

#[test]
fn local_settings_move_the_data_directory() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("hbs-settings.yaml"), "local_directory: survey\n").unwrap();
    let workspace = Workspace::load(&package_dir(), root.path()).unwrap();
    assert_eq!(workspace.layout.local_dir, root.path().join("survey"));
    assert_eq!(
        workspace.layout.cleaned_data,
        root.path().join("survey").join("cleaned")
    );
}

#[test]
fn cleans_extracts_into_parquet() {
    let root = tempfile::tempdir().unwrap();
    write_extract(
        root.path(),
        1390,
        "data",
        "ADDRESS,KHAZAR,FASL,MAH,WEIGHT,OSTAN,SHAHRE,INFOSTATUS,EXTRA\n\
         10001,1390,1,4,350.5,23,1,3,x\n\
         10002,1390,3,9,120,7,2,1,y\n",
    );
    let workspace = Workspace::load(&package_dir(), root.path()).unwrap();

    let mut seen = 0;
    let summary = workspace
        .clean(&["household_information".to_string()], &[1390], |_| seen += 1)
        .unwrap();
    assert_eq!(seen, 1);
    assert_eq!(summary.pairs.len(), 1);
    assert_eq!(summary.pairs[0].rows, 2);

    let written = workspace
        .layout
        .cleaned_data
        .join("1390_household_information.parquet");
    let cleaned = read_parquet_table(&written).unwrap();
    let names: Vec<String> = cleaned
        .get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        names,
        vec![
            "ID",
            "Year",
            "Season",
            "Month",
            "Weight",
            "Province_Code",
            "Urban_Rural"
        ]
    );
}

#[test]
fn missing_extract_fails_the_batch() {
    let root = tempfile::tempdir().unwrap();
    let workspace = Workspace::load(&package_dir(), root.path()).unwrap();
    let err = workspace
        .clean(&["members".to_string()], &[1395], |_| {})
        .unwrap_err();
    assert!(format!("{err:#}").starts_with("clean batch"));
}

#[test]
fn bootstrap_writes_editable_overrides() {
    let root = tempfile::tempdir().unwrap();
    let outcomes = Workspace::bootstrap(&package_dir(), root.path(), false).unwrap();
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.action == SetupAction::Created));
    assert!(root.path().join("hbs-settings.yaml").is_file());
    for name in ["tables", "commodities", "occupations"] {
        assert!(root.path().join("hbs_metadata").join(format!("{name}.yaml")).is_file());
    }

    // The copies load as local overrides.
    let workspace = Workspace::load(&package_dir(), root.path()).unwrap();
    assert_eq!(workspace.context.document("tables").unwrap().sources().len(), 2);
    assert!(workspace.select_tables(&[]).unwrap().contains(&"members".to_string()));

    let again = Workspace::bootstrap(&package_dir(), root.path(), false).unwrap();
    assert!(again.iter().all(|o| o.action == SetupAction::Kept));
    let replaced = Workspace::bootstrap(&package_dir(), root.path(), true).unwrap();
    assert!(replaced.iter().all(|o| o.action == SetupAction::Replaced));
}

#[test]
fn loads_one_table_across_years() {
    let root = tempfile::tempdir().unwrap();
    write_extract(root.path(), 1390, "data", &household_extract(1390));
    write_extract(root.path(), 1391, "data", &household_extract(1391));
    let workspace = Workspace::load(&package_dir(), root.path()).unwrap();
    let table = vec!["household_information".to_string()];
    workspace.clean(&table, &[1390, 1391], |_| {}).unwrap();

    let cleaned = workspace
        .load_table("household_information", &[1390, 1391], TableForm::Cleaned, &[])
        .unwrap();
    assert_eq!(cleaned.height(), 4);
    assert_eq!(
        cleaned.column("Year").unwrap().u16().unwrap().into_iter().collect::<Vec<_>>(),
        vec![Some(1390), Some(1390), Some(1391), Some(1391)]
    );

    let raw = workspace
        .load_table("household_information", &[1391], TableForm::Raw, &[])
        .unwrap();
    assert_eq!(raw.height(), 2);
    assert!(raw.column("INFOSTATUS").is_ok());

    let err = workspace
        .load_table("household_information", &[1392], TableForm::Cleaned, &[])
        .unwrap_err();
    assert!(format!("{err:#}").contains("load cleaned 'household_information' for 1392"));
}

#[test]
fn loaded_tables_can_be_classified() {
    let root = tempfile::tempdir().unwrap();
    write_extract(
        root.path(),
        1390,
        "P3S01",
        "ADDRESS,DYCOL01,DYCOL02,DYCOL03,DYCOL04,DYCOL05,DYCOL06\n\
         10001,11101,1,500,0.5,12.35,6175\n\
         10001,22111,2,,1,3,3\n",
    );
    let workspace = Workspace::load(&package_dir(), root.path()).unwrap();
    workspace.clean(&["food".to_string()], &[1390], |_| {}).unwrap();

    let request: ClassificationRequest = "commodities.food:Commodity_Code:2,4".parse().unwrap();
    let labelled = workspace
        .load_table("food", &[1390], TableForm::Cleaned, &[request])
        .unwrap();
    assert_eq!(
        labels(&labelled, "food_level_2"),
        vec![
            Some("Food and non-alcoholic beverages".to_string()),
            Some("Alcoholic beverages and tobacco".to_string())
        ]
    );
    assert_eq!(
        labels(&labelled, "food_level_4"),
        vec![Some("Bread and cereals".to_string()), None]
    );
}
