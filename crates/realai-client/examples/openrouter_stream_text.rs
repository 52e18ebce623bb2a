use std::sync::Arc;

use realai_client::prelude::*;
use realai_client::vendors::openrouter::OpenRouterClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    realai_client::init_observability();

    let transport = Arc::new(OpenRouterClient::from_env()?);
    let request = ChatRequest::new(DEFAULT_MODEL)
        .message(ChatMessage::system("Reply briefly."))
        .message(ChatMessage::user("Stream a greeting."));

    let mut stream = ChatStream::start(transport, request)?;
    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::TextDelta { text, .. } => print!("{text}"),
            StreamEvent::Image { image, .. } => eprintln!("\n[image: {} chars]", image.len()),
            StreamEvent::Completed { .. } => println!(),
            StreamEvent::Error { error } => eprintln!("stream error: {error}"),
        }
    }

    let _ = stream.finish().await?;
    Ok(())
}
