//! List command handler

use super::utils::{build_client, parse_query};
use crate::cli::ListArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use pterodactyl_core::{ApiKind, Method};
use tracing::{info, instrument};

/// Handle the list command
#[instrument(skip_all, fields(endpoint = %args.endpoint))]
pub async fn handle_list(args: ListArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("list_command", &args.endpoint);

    let api_kind = ApiKind::from(args.api);
    let query = parse_query(&args.query)?;
    let credential_index = config.profile_index(args.profile.as_deref())?;
    let client = build_client(config)?;

    let spinner = if config.output.progress {
        output.spinner(&format!("Fetching {}", args.endpoint))
    } else {
        None
    };

    let result = client
        .request_all_items(Method::GET, api_kind, &args.endpoint, None, query, credential_index)
        .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let items = result?;
    info!(
        items = items.len(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Fetched every page"
    );

    output.items(&items)
}
