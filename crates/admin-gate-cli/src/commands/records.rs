//! Transcript and summary record helpers.

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::ValueEnum;
use gate_config_and_utils::Config;
use serde_json::Value;
use session_gate::{DataStore, SupabaseAuthClient};
use std::io::Read;
use tracing::info;
use transcript_records::{create_summary_update_fields, create_transcript_record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    Transcript,
    Summary,
}

/// Build a record from JSON fields (`-` reads stdin); optionally insert it.
pub async fn records(
    config: &Config,
    kind: RecordKind,
    fields: &str,
    insert: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    // Fail before doing any work when the insert cannot happen.
    let store = match insert {
        Some(_) => Some(SupabaseAuthClient::service_role(config)?),
        None => None,
    };

    let raw = if fields == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fields.to_string()
    };
    let row = build_record(kind, &raw)?;

    if let (Some(store), Some(table)) = (store, insert) {
        store
            .insert(table, row.clone())
            .await
            .with_context(|| format!("insert into {} failed", table))?;
        info!(table = %table, kind = ?kind, "Record inserted");
        output::print_success(&format!("Inserted into {}", table), format);
    }

    output::print_json(&row);
    Ok(())
}

fn build_record(kind: RecordKind, raw: &str) -> Result<Value> {
    let input: Value = serde_json::from_str(raw).context("record fields must be a JSON object")?;
    let row = match kind {
        RecordKind::Transcript => {
            serde_json::to_value(create_transcript_record(serde_json::from_value(input)?)?)?
        }
        RecordKind::Summary => {
            serde_json::to_value(create_summary_update_fields(serde_json::from_value(input)?)?)?
        }
    };
    Ok(row)
}
