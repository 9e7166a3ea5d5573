use sclink_client::ScClient;
use sclink_transport::WebSocketTransport;

use crate::cmd::emit::resolve_payload;
use crate::cmd::PublishArgs;
use crate::exit::{client_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: PublishArgs, _format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(args.json.as_deref(), args.data.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))?;

    runtime.block_on(async move {
        let mut client = ScClient::new(WebSocketTransport::new(&args.connect.url));
        if let Some(token) = &args.connect.token {
            client = client.with_auth_token(token.clone());
        }

        client
            .connect()
            .await
            .map_err(|err| client_error("connect failed", err))?;

        client
            .publish(&args.channel, payload.as_ref())
            .await
            .map_err(|err| client_error("publish failed", err))?;

        client.disconnect().await;
        Ok(SUCCESS)
    })
}
