//! One-shot generation from the command line.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use architect_models::{Attachment, Dispatcher, Export, GenerationRequest, ModelId, RetryPolicy};
use clap::Args;
use tracing::debug;

use super::Session;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Provider to use; optional when --model is given as provider:model
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Model id (e.g., gemini-1.5-flash or groq:llama-3.3-70b-versatile)
    #[arg(long, short)]
    pub model: String,

    /// Instruction sent ahead of any attachments
    #[arg(long)]
    pub prompt: String,

    /// Files to attach, in order (images or text/source files)
    #[arg(long = "attach", value_name = "FILE")]
    pub attachments: Vec<PathBuf>,

    /// Save the result as CSV (when it contains a table) or Markdown
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Heading for Markdown exports
    #[arg(long, requires = "export")]
    pub heading: Option<String>,

    /// Fail immediately on rate limits instead of backing off
    #[arg(long)]
    pub no_retry: bool,
}

pub async fn run(args: GenerateArgs) -> Result<()> {
    let (provider, model) = resolve_target(args.provider.as_deref(), &args.model)?;
    let session = Session::load()?;
    let credential = session.credential(&provider)?;

    let mut attachments = Vec::with_capacity(args.attachments.len());
    for path in &args.attachments {
        attachments.push(Attachment::from_path(path).await?);
    }

    let request = GenerationRequest::new(&credential, model.as_str(), args.prompt.as_str())
        .attachments(attachments);
    let policy = if args.no_retry {
        RetryPolicy::no_retry()
    } else {
        session.config.retry_policy()
    };
    debug!(
        provider = %provider,
        model = %model,
        attachments = request.attachments.len(),
        max_attempts = policy.max_attempts(),
        "running generation"
    );

    let dispatcher = Dispatcher::new(session.registry.clone());
    let text = match dispatcher.generate_with_retry(&request, &policy).await {
        Ok(text) => text,
        Err(err) => bail!("{err}\nhint: {}", err.kind.hint()),
    };

    println!("{text}");

    if let Some(path) = &args.export {
        let mut export = Export::from_text(&text);
        if let Some(heading) = &args.heading {
            export = export.with_heading(heading.as_str());
        }
        let path = export_path(path, &export);
        export.write_to(&path).await?;
        eprintln!("Saved {}", path.display());
    }

    Ok(())
}

/// Split `--provider`/`--model` into a provider id and a bare model id.
///
/// With `--provider`, a matching `provider:` prefix on the model is dropped
/// and anything else is taken verbatim (some model ids contain a colon).
fn resolve_target(provider: Option<&str>, model: &str) -> Result<(String, String)> {
    match (provider, ModelId::parse(model)) {
        (Some(provider), Some(id)) if id.provider() == provider => {
            Ok((provider.to_string(), id.model().to_string()))
        }
        (Some(provider), _) => Ok((provider.to_string(), model.to_string())),
        (None, Some(id)) => Ok((id.provider().to_string(), id.model().to_string())),
        (None, None) => bail!("--provider is required unless --model is given as provider:model"),
    }
}

/// Add the export's extension when the path has none.
fn export_path(path: &Path, export: &Export) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(export.extension())
    }
}
