use realai_client::prelude::*;
use realai_client::vendors::openrouter::OpenRouterClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let client = OpenRouterClient::from_env()?;
    let text = client
        .send_message(
            &[
                ChatMessage::system("You are a concise assistant. Reply with a short sentence."),
                ChatMessage::user("Say hello"),
            ],
            DEFAULT_MODEL,
        )
        .await?;

    println!("{text}");
    Ok(())
}
