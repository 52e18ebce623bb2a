use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::abort::{AbortHandle, AbortSignal};
use crate::content::StreamOutput;
use crate::decode::ChannelSink;
use crate::errors::ClientError;
use crate::request::ChatRequest;
use crate::stream::StreamEvent;
use crate::transport::{ChatTransport, stream_chat};

/// Handle to a chat stream decoded on a background task.
///
/// Use `next_event()` to consume events as they arrive and `finish()` to
/// obtain the aggregated result after the terminal event.
pub struct ChatStream {
    run_id: uuid::Uuid,
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    final_rx: oneshot::Receiver<Result<StreamOutput, ClientError>>,
    abort_handle: AbortHandle,
    saw_terminal: bool,
}

impl ChatStream {
    /// Validates `request` and starts decoding on a spawned task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        transport: Arc<dyn ChatTransport>,
        request: ChatRequest,
    ) -> Result<Self, ClientError> {
        request.validate()?;

        let (sink, rx) = ChannelSink::channel();
        let (final_tx, final_rx) = oneshot::channel();
        let abort_handle = AbortHandle::new();
        let run_id = uuid::Uuid::new_v4();

        tokio::spawn(run_task(
            run_id,
            transport,
            request,
            sink,
            final_tx,
            abort_handle.signal(),
        ));

        Ok(Self {
            run_id,
            rx,
            final_rx,
            abort_handle,
            saw_terminal: false,
        })
    }

    pub fn run_id(&self) -> uuid::Uuid {
        self.run_id
    }

    /// Returns a handle that can cancel the stream.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next event.
    ///
    /// Returns `None` after the terminal event has been consumed and the task
    /// has ended.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let event = self.rx.recv().await;
        if event.as_ref().is_some_and(StreamEvent::is_terminal) {
            self.saw_terminal = true;
        }
        event
    }

    /// Drains remaining events (if needed) and returns the terminal result.
    pub async fn finish(mut self) -> Result<StreamOutput, ClientError> {
        while !self.saw_terminal {
            match self.rx.recv().await {
                Some(event) if event.is_terminal() => self.saw_terminal = true,
                Some(_) => {}
                None => break,
            }
        }

        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Protocol(format!(
                "chat task ended without a final result (run={})",
                self.run_id
            ))),
        }
    }
}

async fn run_task(
    run_id: uuid::Uuid,
    transport: Arc<dyn ChatTransport>,
    request: ChatRequest,
    mut sink: ChannelSink,
    final_tx: oneshot::Sender<Result<StreamOutput, ClientError>>,
    abort: AbortSignal,
) {
    debug!(run_id = %run_id, transport = transport.name(), model = %request.model, "chat stream task started");
    let result = stream_chat(transport.as_ref(), &request, &mut sink, Some(abort)).await;
    let terminal = match &result {
        Ok(output) => StreamEvent::Completed {
            output: output.clone(),
        },
        Err(error) => StreamEvent::Error {
            error: error.clone(),
        },
    };
    debug!(run_id = %run_id, ok = result.is_ok(), "chat stream task finished");
    sink.send_terminal(terminal);
    let _ = final_tx.send(result);
}
