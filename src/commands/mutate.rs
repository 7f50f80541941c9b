use super::CommandContext;
use crate::risk::{RawRisk, Risk};
use crate::store::RiskStore;
use anyhow::{Context, Result};
use colored::*;

fn describe(risk: &Risk) -> String {
    format!(
        "{} ({}, score {} {})",
        risk.title.bold(),
        risk.id,
        risk.risk_score(),
        risk.severity().label()
    )
}

pub async fn add(context: &CommandContext, mut payload: RawRisk) -> Result<()> {
    payload.organization_id = Some(context.organization_id.clone());
    let risk = context
        .store
        .insert_risk(payload)
        .await
        .context("Risk was not added")?;
    println!("{} {}", "Added".green(), describe(&risk));
    Ok(())
}

pub async fn update(context: &CommandContext, id: &str, payload: RawRisk) -> Result<()> {
    let risk = context
        .store
        .update_risk(id, payload)
        .await
        .with_context(|| format!("Risk {id} was not updated"))?;
    println!("{} {}", "Updated".green(), describe(&risk));
    Ok(())
}

pub async fn delete(context: &CommandContext, id: &str) -> Result<()> {
    context
        .store
        .delete_risk(id)
        .await
        .with_context(|| format!("Risk {id} was not deleted"))?;
    println!("{} risk {}", "Deleted".yellow(), id);
    Ok(())
}
