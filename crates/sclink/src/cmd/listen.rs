use serde_json::Value;
use sclink_client::ScClient;
use sclink_transport::WebSocketTransport;
use tokio::sync::mpsc;

use crate::cmd::ListenArgs;
use crate::exit::{client_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_push, OutputFormat, Source};

enum Push {
    Event(String, Option<Value>),
    Channel(String, Option<Value>),
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    if args.channels.is_empty() && args.events.is_empty() {
        return Err(CliError::new(
            USAGE,
            "nothing to listen for: pass --channels and/or --events",
        ));
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))?;

    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel();
    install_ctrlc_handler(stop_tx)?;

    runtime.block_on(async move {
        let mut client = ScClient::new(WebSocketTransport::new(&args.connect.url));
        if let Some(token) = &args.connect.token {
            client = client.with_auth_token(token.clone());
        }

        let (push_tx, mut push_rx) = mpsc::unbounded_channel();
        for channel in &args.channels {
            let tx = push_tx.clone();
            client.on_channel(channel, move |name, data| {
                let _ = tx.send(Push::Channel(name.to_owned(), data.cloned()));
            });
        }
        for event in &args.events {
            let tx = push_tx.clone();
            client.on(event, move |name, data| {
                let _ = tx.send(Push::Event(name.to_owned(), data.cloned()));
            });
        }

        client
            .connect()
            .await
            .map_err(|err| client_error("connect failed", err))?;

        for channel in &args.channels {
            client
                .subscribe(channel, args.connect.token.as_deref())
                .await
                .map_err(|err| client_error("subscribe failed", err))?;
        }

        let run = client.run();
        tokio::pin!(run);

        let mut printed = 0usize;
        loop {
            tokio::select! {
                _ = stop_rx.recv() => {
                    client.disconnect().await;
                    return Ok(SUCCESS);
                }
                reason = &mut run => {
                    return match reason {
                        Some(err) => Err(transport_error("connection lost", err)),
                        None => Ok(SUCCESS),
                    };
                }
                push = push_rx.recv() => {
                    let Some(push) = push else { continue };
                    match &push {
                        Push::Event(name, data) => {
                            print_push(Source::Event(name), data.as_ref(), format);
                        }
                        Push::Channel(name, data) => {
                            print_push(Source::Channel(name), data.as_ref(), format);
                        }
                    }
                    printed = printed.saturating_add(1);
                    if args.count.is_some_and(|count| printed >= count) {
                        client.disconnect().await;
                        return Ok(SUCCESS);
                    }
                }
            }
        }
    })
}

fn install_ctrlc_handler(stop: mpsc::UnboundedSender<()>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        let _ = stop.send(());
    })
    .map_err(|err| {
        CliError::new(
            INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
