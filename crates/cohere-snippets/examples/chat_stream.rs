use std::io::Write;

use cohere_api::ApiClient;
use cohere_types::{ChatMessageV2, ChatRequestV2, StreamChunk};
use futures_util::StreamExt;
use tokio::select;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("CO_API_KEY")?;
    let model = std::env::var("COHERE_MODEL")?;
    let client = ApiClient::new(api_key, "https://api.cohere.com")?;

    let request = ChatRequestV2::new(
        model,
        vec![
            ChatMessageV2::user("Who discovered gravity?"),
            ChatMessageV2::assistant(
                "The man who is widely credited with discovering gravity is Sir Isaac Newton",
            ),
            ChatMessageV2::user("What year was he born?"),
        ],
    );

    let mut chunks = select! {
        opened = client.open_stream(&request) => opened?,
        _ = tokio::signal::ctrl_c() => return Ok(()),
    };
    let mut stdout = std::io::stdout();
    loop {
        select! {
            chunk = chunks.next() => {
                let Some(chunk) = chunk else { break };
                let chunk = chunk?;
                if let Some(text) = chunk.text_delta() {
                    write!(stdout, "{text}")?;
                    stdout.flush()?;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    println!();

    Ok(())
}
