use super::CommandContext;
use crate::cli::{FilterArgs, SortArgs};
use crate::io::{create_writer, write_csv, OutputFormat};
use crate::reconcile::RiskPipeline;
use crate::store::JsonFileStore;
use crate::view::ViewCriteria;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

fn criteria(
    context: &CommandContext,
    filter: &FilterArgs,
    order: Option<&SortArgs>,
) -> ViewCriteria {
    let mut criteria = context.config.view.criteria();
    criteria.filter = filter.to_filter();
    if let Some(order) = order {
        if let Some(field) = order.sort {
            criteria.sort_field = field;
        }
        if let Some(direction) = order.direction {
            criteria.sort_direction = direction;
        }
    }
    criteria
}

/// One refresh against the store with the given criteria installed.
async fn load(
    context: &CommandContext,
    criteria: ViewCriteria,
) -> Result<RiskPipeline<JsonFileStore>> {
    let pipeline = RiskPipeline::new(context.store.clone(), context.organization_id.clone())
        .with_debounce(context.config.reconcile.debounce())
        .with_criteria(criteria);
    pipeline.refresh().await?;
    let skipped = pipeline.snapshot().skipped;
    if skipped > 0 {
        log::warn!("{} invalid records were skipped", skipped);
    }
    Ok(pipeline)
}

pub async fn list(
    context: &CommandContext,
    filter: &FilterArgs,
    order: &SortArgs,
    format: OutputFormat,
) -> Result<()> {
    let pipeline = load(context, criteria(context, filter, Some(order))).await?;
    let risks = pipeline.filtered_sorted_risks(&pipeline.criteria());
    let total = pipeline.snapshot().len();

    let stdout = std::io::stdout();
    create_writer(format, stdout.lock()).write_risks(&risks, total)
}

pub async fn matrix(
    context: &CommandContext,
    filter: &FilterArgs,
    format: OutputFormat,
) -> Result<()> {
    let pipeline = load(context, criteria(context, filter, None)).await?;
    let stdout = std::io::stdout();
    create_writer(format, stdout.lock()).write_matrix(&pipeline.matrix())
}

pub async fn summary(
    context: &CommandContext,
    filter: &FilterArgs,
    top: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let mut criteria = criteria(context, filter, None);
    if let Some(top) = top {
        criteria.top_risks = top;
    }
    let pipeline = load(context, criteria).await?;
    let stdout = std::io::stdout();
    create_writer(format, stdout.lock()).write_summaries(&pipeline.category_summaries())
}

pub async fn stats(
    context: &CommandContext,
    filter: &FilterArgs,
    format: OutputFormat,
) -> Result<()> {
    let pipeline = load(context, criteria(context, filter, None)).await?;
    let stdout = std::io::stdout();
    create_writer(format, stdout.lock()).write_statistics(&pipeline.global_statistics())
}

pub async fn export(
    context: &CommandContext,
    filter: &FilterArgs,
    order: &SortArgs,
    output: Option<&Path>,
) -> Result<()> {
    let criteria = criteria(context, filter, Some(order));
    let pipeline = load(context, criteria.clone()).await?;
    match output {
        Some(path) => {
            let rows = pipeline.export_csv(&criteria, path).await?;
            eprintln!("Exported {} risks to {}", rows, path.display());
        }
        None => {
            let risks = pipeline.filtered_sorted_risks(&criteria);
            let mut stdout = std::io::stdout().lock();
            write_csv(&mut stdout, &risks)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
