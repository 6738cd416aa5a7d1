//! Line-delimited JSON transport for the UI message protocol.
//!
//! Each stdin line is one `UiRequest`; each stdout line is one `UiEvent`.
//! A `dispose` request cancels the in-flight completion and ends the
//! session. EOF ends it once queued requests are handled.

use crate::credentials::CredentialStore;
use crate::editor::ContextSource;
use crate::orchestrator::{self, Orchestrator, UiEvent, UiRequest};
use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

pub async fn run_stdio<S, C>(
    orchestrator: Orchestrator<S, C>,
    events: mpsc::UnboundedReceiver<UiEvent>,
) -> anyhow::Result<()>
where
    S: CredentialStore + Send + 'static,
    C: ContextSource + Send + 'static,
{
    let input = BufReader::new(tokio::io::stdin());
    run(orchestrator, events, input, tokio::io::stdout()).await
}

pub async fn run<S, C, R, W>(
    orchestrator: Orchestrator<S, C>,
    events: mpsc::UnboundedReceiver<UiEvent>,
    input: R,
    output: W,
) -> anyhow::Result<()>
where
    S: CredentialStore + Send + 'static,
    C: ContextSource + Send + 'static,
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let cancel = CancellationToken::new();
    let (req_tx, req_rx) = mpsc::unbounded_channel::<UiRequest>();

    orchestrator.ready();
    let writer = tokio::spawn(write_events(events, output));
    let reader = tokio::spawn(read_requests(
        input,
        req_tx,
        orchestrator.events(),
        cancel.clone(),
    ));

    orchestrator::serve(orchestrator, req_rx, cancel).await;

    // The writer finishes once the reader drops its event sender too.
    reader.abort();
    let _ = reader.await;
    writer.await.context("event writer task failed")??;
    Ok(())
}

async fn read_requests<R>(
    input: R,
    requests: mpsc::UnboundedSender<UiRequest>,
    events: mpsc::UnboundedSender<UiEvent>,
    cancel: CancellationToken,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LinesStream::new(input.lines());
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read UI input");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<UiRequest>(&line) {
            Ok(UiRequest::Dispose) => {
                tracing::info!("UI disposed");
                cancel.cancel();
                break;
            }
            Ok(req) => {
                if requests.send(req).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = events.send(UiEvent::Error(format!("invalid message: {e}")));
            }
        }
    }
    tracing::debug!("UI input closed");
}

async fn write_events<W>(
    mut events: mpsc::UnboundedReceiver<UiEvent>,
    mut output: W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        let mut line = serde_json::to_vec(&event).context("failed to serialize UI event")?;
        line.push(b'\n');
        output.write_all(&line).await.context("failed to write UI event")?;
        output.flush().await.context("failed to flush UI event")?;
    }
    Ok(())
}
