use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use recon_cli::config::Settings;
use recon_client::{ReconClient, ReconcileService};
use recon_model::{Column, ComparisonResult, DocumentHandle, DocumentSide};
use recon_workflow::{Authenticator, Session};

use crate::cli::{ColumnsArgs, CompareArgs, DeleteArgs};
use crate::progress::with_spinner;

/// What a `compare` run produced besides the result itself.
pub struct CompareOutcome {
    pub result: ComparisonResult,
    pub saved_id: Option<String>,
    pub report: Option<PathBuf>,
}

pub async fn run_columns(settings: &Settings, args: &ColumnsArgs) -> Result<Vec<Column>> {
    ensure_signed_in(settings)?;
    let client = ReconClient::new(settings.service.clone())?;
    let document = open_document(&args.file)?;
    let columns = with_spinner(
        &format!("Analyzing columns of {}", document.name()),
        client.discover_columns(&document),
    )
    .await?;
    Ok(columns)
}

pub async fn run_compare(settings: &Settings, args: &CompareArgs) -> Result<CompareOutcome> {
    let client = ReconClient::new(settings.service.clone())?;
    let mut session = Session::start(client, &settings.authenticator())?;

    for (side, path) in [
        (DocumentSide::Source, &args.source),
        (DocumentSide::Target, &args.target),
    ] {
        let document = open_document(path)?;
        let message = format!("Analyzing columns of {}", document.name());
        session.select_document(side, document)?;
        with_spinner(&message, session.advance()).await?;
    }

    apply_mappings(&mut session, args)?;
    let mapping = session.workflow().mapping();
    if !mapping.has_active() {
        let source = session.workflow().columns(DocumentSide::Source).join(", ");
        let target = session.workflow().columns(DocumentSide::Target).join(", ");
        bail!(
            "no source column could be paired automatically; use --map SRC=TGT\n  \
             source columns: {source}\n  target columns: {target}"
        );
    }
    tracing::info!(
        rows = mapping.active_len(),
        skipped = mapping.len() - mapping.active_len(),
        "Mapping ready"
    );

    with_spinner("Comparing documents", session.advance()).await?;
    let result = session
        .workflow()
        .result()
        .cloned()
        .context("comparison finished without a result")?;

    let saved_id = match &args.save {
        Some(name) => Some(with_spinner("Saving comparison", session.save(name)).await?),
        None => None,
    };

    let report = match &args.export {
        Some(path) => {
            let document = with_spinner("Exporting report", session.export()).await?;
            let destination = if path.is_dir() {
                path.join(&document.file_name)
            } else {
                path.clone()
            };
            std::fs::write(&destination, &document.bytes)
                .with_context(|| format!("failed to write report to {}", destination.display()))?;
            Some(destination)
        }
        None => None,
    };

    Ok(CompareOutcome {
        result,
        saved_id,
        report,
    })
}

pub async fn run_delete(settings: &Settings, args: &DeleteArgs) -> Result<()> {
    if !args.yes {
        bail!(
            "refusing to delete saved comparison {} without confirmation; pass --yes",
            args.id
        );
    }
    ensure_signed_in(settings)?;
    let client = ReconClient::new(settings.service.clone())?;
    with_spinner("Deleting saved comparison", client.delete(&args.id)).await?;
    Ok(())
}

/// Replace the seeded rows with `--map` pairs, then attach instructions.
fn apply_mappings<S: ReconcileService>(session: &mut Session<S>, args: &CompareArgs) -> Result<()> {
    let workflow = session.workflow_mut();
    if !args.map.is_empty() {
        workflow.clear_mapping()?;
        for pair in &args.map {
            workflow.set_pair(&pair.key, &pair.value)?;
        }
    }
    for instruction in &args.instruction {
        let Some(index) = workflow.mapping().position_of(&instruction.key) else {
            bail!(
                "--instruction {instruction}: source column '{}' is not mapped",
                instruction.key
            );
        };
        workflow.set_instruction(index, &instruction.value)?;
    }
    Ok(())
}

fn open_document(path: &Path) -> Result<DocumentHandle> {
    DocumentHandle::open(path).with_context(|| format!("cannot open {}", path.display()))
}

fn ensure_signed_in(settings: &Settings) -> Result<()> {
    if !settings.authenticator().is_authenticated() {
        bail!("an API token is required; set service.api_token in the settings file");
    }
    Ok(())
}
