use std::time::Duration;

use cohere_api::{ApiClient, WaitConfig};
use cohere_types::{CreateDatasetRequest, DatasetType, FileUpload, GetDatasetRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("CO_API_KEY")?;
    let client = ApiClient::new(api_key, "https://api.cohere.com")?;

    // One {"text": ...} object per line.
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "embed_jobs_sample_data.jsonl".to_string());
    let bytes = tokio::fs::read(&path).await?;

    let request = CreateDatasetRequest::new(
        "my-dataset",
        DatasetType::EmbedInput,
        FileUpload::new("embed_jobs_sample_data.jsonl", bytes),
    );
    let created = client.send(&request).await?;
    let id = created.id.ok_or("dataset created without an id")?;
    println!("uploaded {id}");

    let wait = WaitConfig {
        poll_interval: Duration::from_secs(5),
        timeout: Duration::from_secs(300),
    };
    let dataset = client.wait(&GetDatasetRequest { id }, &wait).await?.dataset;
    println!("{} is {}", dataset.id, dataset.validation_status.as_str());
    if let Some(error) = dataset.validation_error {
        println!("validation error: {error}");
    }

    Ok(())
}
