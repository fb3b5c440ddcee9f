//! Request command handler

use super::utils::{build_client, parse_method, parse_query, read_body, request_options};
use crate::cli::RequestArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use pterodactyl_core::ApiKind;
use tracing::{info, instrument};

/// Handle the request command
#[instrument(skip_all, fields(method = %args.method, endpoint = %args.endpoint))]
pub async fn handle_request(args: RequestArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("request_command", &args.endpoint);

    let method = parse_method(&args.method)?;
    let api_kind = ApiKind::from(args.api);
    let body = read_body(args.body.as_deref())?;
    let query = parse_query(&args.query)?;
    let options = request_options(&args.headers, args.timeout)?;
    let credential_index = config.profile_index(args.profile.as_deref())?;

    let client = build_client(config)?;
    info!(api = %api_kind, credential_index, "Sending request");

    let response = client
        .request(method, api_kind, &args.endpoint, body, query, options, credential_index)
        .await?;

    output.response(&response)
}
