use cohere_api::ApiClient;
use cohere_types::{ClassifyExample, ClassifyRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("CO_API_KEY")?;
    let client = ApiClient::new(api_key, "https://api.cohere.com")?;

    let request = ClassifyRequest {
        inputs: vec!["peach".to_string()],
        examples: vec![
            ClassifyExample::new("apple", "fruit"),
            ClassifyExample::new("banana", "fruit"),
            ClassifyExample::new("carrot", "vegetable"),
            ClassifyExample::new("broccoli", "vegetable"),
        ],
        ..ClassifyRequest::default()
    };

    let response = client.send(&request).await?;
    for classification in &response.classifications {
        println!(
            "{:?} -> {:?} ({:?})",
            classification.input, classification.prediction, classification.confidence
        );
    }

    Ok(())
}
