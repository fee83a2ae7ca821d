use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info_span;

use hbs_clean::BatchSummary;
use hbs_cli::{TableForm, Workspace};
use hbs_config::SetupAction;
use hbs_ingest::{CsvExtractSource, write_parquet_table};
use hbs_metadata::ColumnMetadata;

use crate::cli::{CleanArgs, InitArgs, LoadArgs, MetadataCommand, TableFormArg, TablesArgs};
use crate::summary::{align_column, apply_table_style, dim_cell, header_cell};

pub fn run_clean(workspace: &Workspace, args: &CleanArgs) -> Result<BatchSummary> {
    let years = args
        .years
        .expand_for(&workspace.layout)
        .context("select years")?;
    let tables = workspace.select_tables(&args.tables)?;
    let span = info_span!("batch", tables = tables.len(), years = years.len());
    let _guard = span.enter();

    let total = u64::try_from(tables.len() * years.len()).unwrap_or(u64::MAX);
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .context("progress bar template")?
            .progress_chars("=> "),
    );
    let result = workspace.clean(&tables, &years, |progress| {
        bar.set_position(u64::try_from(progress.index).unwrap_or(u64::MAX));
        bar.set_message(format!("{} {}", progress.table, progress.year));
    });
    bar.finish_and_clear();
    let summary = result?;

    if let Some(path) = &args.report {
        let report = serde_json::to_string_pretty(&summary).context("serialize batch report")?;
        fs::write(path, report)
            .with_context(|| format!("write batch report {}", path.display()))?;
        println!("Report: {}", path.display());
    }
    Ok(summary)
}

pub fn run_settings(workspace: &Workspace) -> Result<()> {
    let settings = workspace.context.settings();
    println!("Package: {}", settings.package_dir().display());
    println!("Root: {}", settings.root_dir().display());

    let mut table = Table::new();
    table.set_header(vec![header_cell("Setting"), header_cell("Value")]);
    apply_table_style(&mut table);
    for (key, value) in settings.iter() {
        let text = serde_yaml::to_string(value).context("render setting")?;
        table.add_row(vec![Cell::new(key), Cell::new(text.trim_end())]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_metadata(workspace: &Workspace, command: &MetadataCommand) -> Result<()> {
    match command {
        MetadataCommand::Status => metadata_status(workspace),
        MetadataCommand::Show { table, year } => show_table(workspace, table, *year),
        MetadataCommand::Label {
            document,
            name,
            code,
            year,
        } => label_code(workspace, document, name, *code, *year),
    }
}

fn metadata_status(workspace: &Workspace) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Document"),
        header_cell("Entries"),
        header_cell("Sources"),
        header_cell("Digest"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for document in workspace.context.documents() {
        let sources: Vec<String> = document
            .sources()
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        table.add_row(vec![
            Cell::new(document.name())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(document.keys().count()),
            Cell::new(sources.join("\n")),
            dim_cell(&document.digest()[..12]),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn show_table(workspace: &Workspace, table_name: &str, year: u32) -> Result<()> {
    let metadata = workspace
        .context
        .table_metadata(table_name, year)
        .with_context(|| format!("resolve metadata of '{table_name}' for {year}"))?;
    let settings = metadata.settings();
    println!("Table: {table_name} ({year})");
    println!("Extract: {}", metadata.file_code().unwrap_or("unavailable"));
    println!("Unlisted columns: {}", settings.missings);
    println!("Sanitize text: {}", if settings.sanitize { "yes" } else { "no" });

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Raw column"),
        header_cell("Action"),
        header_cell("New name"),
        header_cell("Type"),
        header_cell("Replacements"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    for (raw, column) in metadata.columns() {
        let row = match column {
            ColumnMetadata::Drop => vec![
                Cell::new(raw),
                dim_cell("drop"),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
            ],
            ColumnMetadata::Error => vec![
                Cell::new(raw),
                Cell::new("error").fg(Color::Red),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
            ],
            ColumnMetadata::Keep(spec) => vec![
                Cell::new(raw),
                Cell::new("keep").fg(Color::Green),
                Cell::new(&spec.new_name),
                Cell::new(spec.declared.name()),
                match &spec.replace {
                    Some(replace) => Cell::new(replace.len()),
                    None => dim_cell("-"),
                },
            ],
        };
        table.add_row(row);
    }
    println!("{table}");
    Ok(())
}

fn label_code(workspace: &Workspace, document: &str, name: &str, code: u64, year: u32) -> Result<()> {
    let classification = workspace
        .context
        .classification(document, name, year)
        .with_context(|| format!("resolve classification '{name}' of '{document}' for {year}"))?;

    let mut table = Table::new();
    table.set_header(vec![header_cell("Level"), header_cell("Label")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for level in classification.levels() {
        let label = match classification.label(code, level) {
            Some(label) => Cell::new(label),
            None => dim_cell("-"),
        };
        table.add_row(vec![Cell::new(level), label]);
    }
    println!("{name} code {code} ({year})");
    println!("{table}");
    Ok(())
}

pub fn run_tables(workspace: &Workspace, args: &TablesArgs) -> Result<()> {
    let year = args.year.unwrap_or(workspace.layout.last_year);
    let source = CsvExtractSource::from_layout(&workspace.layout);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Extract"),
        header_cell("On disk"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for name in workspace.context.table_names().context("list tables")? {
        let file_code = workspace
            .context
            .resolve_file_identifier(&name, year)
            .with_context(|| format!("resolve extract of '{name}' for {year}"))?;
        let (extract, on_disk) = match file_code {
            Some(code) => {
                let present = source.path_for(year, &code).is_file();
                (
                    Cell::new(code),
                    if present {
                        Cell::new("✓").fg(Color::Green)
                    } else {
                        dim_cell("-")
                    },
                )
            }
            None => (dim_cell("unavailable"), dim_cell("-")),
        };
        table.add_row(vec![Cell::new(name), extract, on_disk]);
    }
    println!("Year: {year}");
    println!("{table}");
    Ok(())
}

pub fn run_load(workspace: &Workspace, args: &LoadArgs) -> Result<()> {
    let years = args
        .years
        .expand_for(&workspace.layout)
        .context("select years")?;
    let form = match args.form {
        TableFormArg::Raw => TableForm::Raw,
        TableFormArg::Cleaned => TableForm::Cleaned,
    };
    let mut df = workspace.load_table(&args.table, &years, form, &args.classify)?;

    let year_list: Vec<String> = years.iter().map(u32::to_string).collect();
    println!("Table: {} ({})", args.table, year_list.join(", "));
    println!("Rows: {}", df.height());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Missing"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for column in df.get_columns() {
        let missing = column.null_count();
        table.add_row(vec![
            Cell::new(column.name()),
            dim_cell(&column.dtype().to_string()),
            if missing == 0 {
                dim_cell("0")
            } else {
                Cell::new(missing)
            },
        ]);
    }
    println!("{table}");

    if args.head > 0 {
        println!("{}", df.head(Some(args.head)));
    }
    if let Some(path) = &args.output {
        write_parquet_table(path, &mut df).with_context(|| format!("write {}", path.display()))?;
        println!("Written: {}", path.display());
    }
    Ok(())
}

pub fn run_init(package_dir: &Path, root_dir: &Path, args: &InitArgs) -> Result<()> {
    let outcomes = Workspace::bootstrap(package_dir, root_dir, args.replace)?;

    let mut table = Table::new();
    table.set_header(vec![header_cell("File"), header_cell("Action")]);
    apply_table_style(&mut table);
    for outcome in &outcomes {
        let action = match outcome.action {
            SetupAction::Created => Cell::new("created").fg(Color::Green),
            SetupAction::Replaced => Cell::new("replaced").fg(Color::Yellow),
            SetupAction::Kept => dim_cell("kept"),
        };
        table.add_row(vec![Cell::new(outcome.path.display()), action]);
    }
    println!("{table}");
    if outcomes.iter().any(|o| o.action == SetupAction::Kept) {
        println!("Existing files were kept; pass --replace to overwrite them.");
    }
    Ok(())
}
