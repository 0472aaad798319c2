//! Provider listing.

use anyhow::Result;
use architect_models::registry::{ApiShape, Listing, ProviderDescriptor};
use architect_models::{CredentialSource, CredentialStore};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use super::Session;

/// Print every registered provider with its endpoint and key status.
pub fn run() -> Result<()> {
    let session = Session::load()?;
    let table = render(session.registry.descriptors(), &session.credentials);
    println!("{table}");
    Ok(())
}

fn render<'a>(
    descriptors: impl Iterator<Item = &'a ProviderDescriptor>,
    credentials: &CredentialStore,
) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("API").fg(Color::Cyan),
        Cell::new("Images").fg(Color::Cyan),
        Cell::new("Endpoint").fg(Color::Cyan),
        Cell::new("API key").fg(Color::Cyan),
    ]);

    for descriptor in descriptors {
        let key = match credentials.credential_source(&descriptor.id) {
            Some(CredentialSource::Keyring) => Cell::new("keyring").fg(Color::Green),
            Some(CredentialSource::Environment) => Cell::new("environment").fg(Color::Green),
            None => Cell::new("missing").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&descriptor.id),
            Cell::new(&descriptor.display_name),
            Cell::new(api_label(descriptor)),
            Cell::new(if descriptor.supports_multimodal { "yes" } else { "no" }),
            Cell::new(&descriptor.base_endpoint),
            key,
        ]);
    }

    table
}

fn api_label(descriptor: &ProviderDescriptor) -> String {
    let api = match descriptor.api {
        ApiShape::Gemini => "gemini",
        ApiShape::OpenAiCompatible => "openai-compatible",
    };
    match &descriptor.listing {
        Listing::Live => api.to_string(),
        Listing::Static(models) => format!("{api} ({} fixed models)", models.len()),
    }
}
