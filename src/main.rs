use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use survey_filter::data::filter::FilterSet;
use survey_filter::data::model::{Dataset, Record};
use survey_filter::data::view::FilteredView;
use survey_filter::{Config, Session};

/// Widest a cell may be printed before it is cut.
const MAX_CELL_WIDTH: usize = 28;

#[derive(Parser, Debug)]
#[command(name = "survey-filter", version, about = "Query community survey sheets")]
struct Args {
    /// Sheet to query (.csv, .json, .parquet or .xlsx)
    file: PathBuf,

    /// JSON config file (defaults to $SURVEY_FILTER_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep rows whose column matches one of the values, e.g. "Comunidade=Vila Aliança|Centro"
    #[arg(long = "filter", value_name = "COL=V1|V2")]
    filters: Vec<String>,

    /// Keep rows whose numeric column lies in an inclusive range, e.g. "Idade=18..60"
    #[arg(long = "range", value_name = "COL=LO..HI")]
    ranges: Vec<String>,

    /// List the distinct values of a column matching a search term
    #[arg(long, value_name = "COL=QUERY")]
    search: Option<String>,

    /// Columns to print, comma separated
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Page of results to print (1-based)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Print the inferred column profiles instead of rows
    #[arg(long)]
    profile: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let mut session = Session::new();
    session.load(&args.file, &config);
    if let Some(err) = session.error() {
        bail!("could not load {}: {err}", args.file.display());
    }
    let filters = {
        let dataset = session.dataset().context("no dataset loaded")?;

        if args.profile {
            print_profiles(dataset);
            return Ok(());
        }

        if let Some(search) = &args.search {
            let (column, query) = split_assignment(search)?;
            let profile = dataset
                .profile(column)
                .ok_or_else(|| anyhow!("unknown column '{column}'"))?;
            for value in profile.search(query, config.engine.search_limit) {
                println!("{value}");
            }
            return Ok(());
        }

        build_filters(dataset, &args.filters, &args.ranges)?
    };
    session.replace_filters(filters);

    let dataset = session.dataset().context("no dataset loaded")?;
    let view = session.view().context("no dataset loaded")?;
    let columns = display_columns(dataset, &args.columns, config.display.display_columns)?;
    print_page(&view, &columns, args.page, config.display.page_size);

    println!();
    if session.filters().is_empty() {
        println!("No filters applied - showing every record");
    } else {
        println!("Active filters:");
        for predicate in session.filters().iter() {
            println!("  • {predicate}");
        }
    }
    println!("{}", view.stats());
    Ok(())
}

/// Split `COL=VALUE` at the first `=`.
fn split_assignment(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .map(|(col, value)| (col.trim(), value))
        .ok_or_else(|| anyhow!("expected COL=VALUE, got '{arg}'"))
}

fn parse_range(arg: &str) -> Result<(&str, f64, f64)> {
    let (column, bounds) = split_assignment(arg)?;
    let (low, high) = bounds
        .split_once("..")
        .ok_or_else(|| anyhow!("expected LO..HI, got '{bounds}'"))?;
    let low = low.trim().parse::<f64>().with_context(|| format!("bad lower bound in '{arg}'"))?;
    let high = high.trim().parse::<f64>().with_context(|| format!("bad upper bound in '{arg}'"))?;
    Ok((column, low, high))
}

fn build_filters(dataset: &Dataset, filters: &[String], ranges: &[String]) -> Result<FilterSet> {
    let mut builder = FilterSet::builder(dataset);
    for arg in filters {
        let (column, values) = split_assignment(arg)?;
        builder = builder.membership(column, membership_values(values))?;
    }
    for arg in ranges {
        let (column, low, high) = parse_range(arg)?;
        builder = builder.range(column, low, high)?;
    }
    Ok(builder.build())
}

/// `V1|V2` as a list of values. Blank parts are skipped, but a wholly blank
/// value (`Obs=`) selects the empty value itself.
fn membership_values(values: &str) -> Vec<&str> {
    if values.trim().is_empty() {
        return vec![""];
    }
    values.split('|').filter(|v| !v.trim().is_empty()).collect()
}

fn display_columns(dataset: &Dataset, requested: &[String], default_count: usize) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(dataset.column_names().iter().take(default_count).cloned().collect());
    }
    for col in requested {
        if !dataset.has_column(col) {
            bail!("unknown column '{col}'");
        }
    }
    Ok(requested.to_vec())
}

fn print_profiles(dataset: &Dataset) {
    println!("{} records × {} columns", dataset.len(), dataset.column_names().len());
    for col in dataset.column_names() {
        let Some(profile) = dataset.profile(col) else {
            continue;
        };
        match profile.range() {
            Some((min, max)) => println!("{col} ({}): {min} to {max}", profile.kind()),
            None => println!(
                "{col} ({}): {} distinct values",
                profile.kind(),
                profile.distinct_values().len()
            ),
        }
    }
}

fn print_page(view: &FilteredView<'_>, columns: &[String], number: usize, page_size: usize) {
    if view.is_empty() {
        println!("No records match the active filters.");
        return;
    }
    let page = view.page(number, page_size);
    let rows: Vec<Vec<String>> = view
        .page_records(&page)
        .map(|record| row_cells(record, columns))
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let header: Vec<String> = columns.iter().map(|c| clip(c)).collect();
    print_row(&header, &widths);
    for row in &rows {
        print_row(row, &widths);
    }
    println!("{} (page {} of {})", page.caption(), page.number, page.total_pages);
}

fn row_cells(record: &Record, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|col| clip(&record.get(col).map(|v| v.to_string()).unwrap_or_default()))
        .collect()
}

fn print_row(cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    println!("{}", line.join(" | ").trim_end());
}

fn clip(s: &str) -> String {
    if s.chars().count() <= MAX_CELL_WIDTH {
        return s.to_string();
    }
    let mut out: String = s.chars().take(MAX_CELL_WIDTH - 1).collect();
    out.push('…');
    out
}
