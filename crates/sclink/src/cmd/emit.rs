use std::time::Duration;

use serde_json::Value;
use sclink_client::ScClient;
use sclink_transport::WebSocketTransport;
use tokio::sync::oneshot;

use crate::cmd::EmitArgs;
use crate::exit::{client_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_push, OutputFormat, Source};

pub fn run(args: EmitArgs, format: OutputFormat) -> CliResult<i32> {
    let ack_timeout = parse_duration(&args.ack_timeout)?;
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

        if !args.ack {
            client
                .emit(&args.event, payload.as_ref())
                .await
                .map_err(|err| client_error("emit failed", err))?;
            client.disconnect().await;
            return Ok(SUCCESS);
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        client
            .emit_ack(&args.event, payload.as_ref(), move |name, error, data| {
                let _ = ack_tx.send((name.to_owned(), error, data));
            })
            .await
            .map_err(|err| client_error("emit failed", err))?;

        let outcome = tokio::select! {
            ack = ack_rx => ack.ok(),
            reason = client.run() => {
                return Err(match reason {
                    Some(err) => crate::exit::transport_error("connection lost", err),
                    None => CliError::new(crate::exit::FAILURE, "connection closed before ack"),
                });
            }
            _ = tokio::time::sleep(ack_timeout) => None,
        };

        client.disconnect().await;

        match outcome {
            Some((name, Some(error), _)) => Err(CliError::new(
                crate::exit::FAILURE,
                format!("server rejected {name}: {error}"),
            )),
            Some((name, None, data)) => {
                print_push(Source::Event(&name), data.as_ref(), format);
                Ok(SUCCESS)
            }
            None => Err(CliError::new(
                TIMEOUT,
                format!("no ack within {}", args.ack_timeout),
            )),
        }
    })
}

pub(crate) fn resolve_payload(
    json: Option<&str>,
    data: Option<&str>,
) -> CliResult<Option<Value>> {
    if let Some(json) = json {
        let value = serde_json::from_str(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(Some(value));
    }
    Ok(data.map(|text| Value::String(text.to_owned())))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
