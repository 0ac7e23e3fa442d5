use cohere_api::ApiClient;
use cohere_types::{ChatConnector, ChatMessage, ChatRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("CO_API_KEY")?;
    let client = ApiClient::new(api_key, "https://api.cohere.com")?.with_client_name("snippet");

    let mut request = ChatRequest::new("What year was he born?");
    request.chat_history = vec![
        ChatMessage::user("Who discovered gravity?"),
        ChatMessage::chatbot(
            "The man who is widely credited with discovering gravity is Sir Isaac Newton",
        ),
    ];
    // Search the web before answering; a custom connector id works too.
    request.connectors = vec![ChatConnector::new("web-search")];

    let response = client.send(&request).await?;
    println!("{}", response.text);

    Ok(())
}
