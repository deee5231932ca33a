//! Regions command - print the region catalog for reviewing geometry.

use clap::Args;
use serde::Serialize;

use rtvue_core::catalog::{self, Category, FieldSpec, TemplateId};

/// Arguments for the regions command.
#[derive(Args)]
pub struct RegionsArgs {
    /// Layout number (1: two-eye, 2: single-eye); all layouts when omitted
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
    template: Option<u8>,

    /// Only this category
    #[arg(long, value_enum)]
    category: Option<CategoryArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: RegionsFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum CategoryArg {
    Info,
    Exam,
    Map,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Info => Category::Info,
            CategoryArg::Exam => Category::Exam,
            CategoryArg::Map => Category::Map,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum RegionsFormat {
    Json,
    Csv,
}

/// One catalog row.
#[derive(Serialize)]
struct RegionRow<'a> {
    template: u8,
    category: Category,
    #[serde(flatten)]
    spec: &'a FieldSpec,
}

pub async fn run(args: RegionsArgs) -> anyhow::Result<()> {
    let templates: Vec<TemplateId> = match args.template {
        Some(n) => vec![TemplateId::from_number(n)
            .ok_or_else(|| anyhow::anyhow!("Unknown template: {}", n))?],
        None => TemplateId::ALL.to_vec(),
    };
    let categories: Vec<Category> = match args.category {
        Some(c) => vec![c.into()],
        None => Category::ALL.to_vec(),
    };

    let rows = collect_rows(&templates, &categories);

    match args.format {
        RegionsFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        RegionsFormat::Csv => print!("{}", format_csv(&rows)?),
    }

    Ok(())
}

fn collect_rows(templates: &[TemplateId], categories: &[Category]) -> Vec<RegionRow<'static>> {
    templates
        .iter()
        .flat_map(|&template| {
            categories.iter().flat_map(move |&category| {
                catalog::regions_for(template, category)
                    .iter()
                    .map(move |spec| RegionRow {
                        template: template.number(),
                        category,
                        spec,
                    })
            })
        })
        .collect()
}

fn format_csv(rows: &[RegionRow<'_>]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "template",
        "category",
        "name",
        "x",
        "y",
        "width",
        "height",
        "allowed_chars",
    ])?;

    for row in rows {
        wtr.write_record([
            &row.template.to_string(),
            &row.category.to_string(),
            &row.spec.name,
            &row.spec.x.to_string(),
            &row.spec.y.to_string(),
            &row.spec.width.to_string(),
            &row.spec.height.to_string(),
            &row.spec.allowed_chars,
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}
