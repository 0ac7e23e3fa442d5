//! Sample requests from the API documentation, used as subcommand defaults.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cohere_types::{ChatMessage, ChatMessageV2, ClassifyExample, Tool, ToolParameter, ToolV2};
use serde_json::json;

pub const CHAT_MESSAGE: &str = "What year was he born?";
pub const CHAT_CONNECTOR: &str = "web-search";

/// The two prior turns every chat sample sends.
pub fn chat_history() -> Vec<ChatMessage> {
    vec![
        ChatMessage::user("Who discovered gravity?"),
        ChatMessage::chatbot(
            "The man who is widely credited with discovering gravity is Sir Isaac Newton",
        ),
    ]
}

pub fn chat_history_v2() -> Vec<ChatMessageV2> {
    vec![
        ChatMessageV2::user("Who discovered gravity?"),
        ChatMessageV2::assistant(
            "The man who is widely credited with discovering gravity is Sir Isaac Newton",
        ),
    ]
}

pub const TOOLS_MESSAGE: &str = "Can you provide a sales summary for 29th September 2023, and \
    also give me some details about the products in the 'Electronics' category, for example \
    their prices and stock levels?";

fn required_param(param_type: &str, description: &str) -> ToolParameter {
    ToolParameter {
        description: Some(description.to_string()),
        param_type: param_type.to_string(),
        required: true,
    }
}

/// The sales-report tools, in the v1 `parameter_definitions` form.
pub fn sales_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "query_daily_sales_report".into(),
            description: "Connects to a database to retrieve overall sales volumes and sales \
                          information for a given day."
                .into(),
            parameter_definitions: BTreeMap::from([(
                "day".to_string(),
                required_param("str", "Retrieves sales data for this day, formatted as YYYY-MM-DD."),
            )]),
        },
        Tool {
            name: "query_product_catalog".into(),
            description: "Connects to a a product catalog with information about all the \
                          products being sold, including categories, prices, and stock levels."
                .into(),
            parameter_definitions: BTreeMap::from([(
                "category".to_string(),
                required_param(
                    "str",
                    "Retrieves product information data for all products in this category.",
                ),
            )]),
        },
    ]
}

/// The same tools described with JSON schemas for v2.
pub fn sales_tools_v2() -> Vec<ToolV2> {
    vec![
        ToolV2::function(
            "query_daily_sales_report",
            "Connects to a database to retrieve overall sales volumes and sales information \
             for a given day.",
            json!({
                "type": "object",
                "properties": {
                    "day": {
                        "type": "string",
                        "description": "Retrieves sales data for this day, formatted as YYYY-MM-DD."
                    }
                },
                "required": ["day"]
            }),
        ),
        ToolV2::function(
            "query_product_catalog",
            "Connects to a a product catalog with information about all the products being \
             sold, including categories, prices, and stock levels.",
            json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Retrieves product information data for all products in this category."
                    }
                },
                "required": ["category"]
            }),
        ),
    ]
}

pub const EMBED_TEXTS: [&str; 2] = ["hello", "goodbye"];

pub const RERANK_QUERY: &str = "What is the capital of the United States?";

pub fn rerank_documents() -> Vec<&'static str> {
    vec![
        "Carson City is the capital city of the American state of Nevada.",
        "The Commonwealth of the Northern Mariana Islands is a group of islands in the Pacific \
         Ocean. Its capital is Saipan.",
        "Capitalization or capitalisation in English grammar is the use of a capital letter at \
         the start of a word. English usage varies from capitalization in other languages.",
        "Washington, D.C. (also known as simply Washington or D.C., and officially as the \
         District of Columbia) is the capital of the United States. It is a federal district.",
        "Capital punishment has existed in the United States since beforethe United States was a \
         country. As of 2017, capital punishment is legal in 30 of the 50 states.",
    ]
}

pub const CLASSIFY_INPUTS: [&str; 2] = ["Confirm your email address", "hey i need u to send some $"];

pub fn classify_examples() -> Vec<ClassifyExample> {
    [
        ("Dermatologists don't like her!", "Spam"),
        ("'Hello, open to this?'", "Spam"),
        ("I need help please wire me $1000 right now", "Spam"),
        ("Nice to know you ;)", "Spam"),
        ("Please help me?", "Spam"),
        ("Your parcel will be delivered today", "Not spam"),
        ("Review changes to our Terms and Conditions", "Not spam"),
        ("Weekly sync notes", "Not spam"),
        ("'Re: Follow up from today's meeting'", "Not spam"),
        ("Pre-read for tomorrow", "Not spam"),
    ]
    .into_iter()
    .map(|(text, label)| ClassifyExample::new(text, label))
    .collect()
}

pub const TOKENIZE_TEXT: &str = "tokenize me! :D";
pub const DETOKENIZE_TOKENS: [i64; 5] = [10002, 1706, 1722, 5169, 4328];

pub const GENERATE_PROMPT: &str = "Please explain to me how LLMs work";

pub const SUMMARIZE_TEXT: &str = "Ice cream is a sweetened frozen food typically eaten as a snack \
    or dessert. It may be made from milk or cream and is flavoured with a sweetener, either sugar \
    or an alternative, and a spice, such as cocoa or vanilla, or with fruit such as strawberries \
    or peaches. It can also be made by whisking a flavored cream base and liquid nitrogen \
    together. Food coloring is sometimes added, in addition to stabilizers. The mixture is cooled \
    below the freezing point of water and stirred to incorporate air spaces and to prevent \
    detectable ice crystals from forming. The result is a smooth, semi-solid foam that is solid \
    at very low temperatures (below 2 °C or 35 °F). It becomes more malleable as its temperature \
    increases.\n\nThe meaning of the name \"ice cream\" varies from one country to another. In \
    some countries, such as the United States, \"ice cream\" applies only to a specific variety, \
    and most governments regulate the commercial use of the various terms according to the \
    relative quantities of the main ingredients, notably the amount of cream. Products that do \
    not meet the criteria to be called ice cream are sometimes labelled \"frozen dairy dessert\" \
    instead. In other countries, such as Italy and Argentina, one word is used for all variants. \
    Analogues made from dairy alternatives, such as goat's or sheep's milk, or milk substitutes \
    (e.g., soy, cashew, coconut, almond milk or tofu), are available for those who are lactose \
    intolerant, allergic to dairy protein or vegan.";

/// A bare string becomes a grounding document with a single `snippet` field.
pub fn snippet_document(text: &str) -> cohere_types::Document {
    let mut doc = cohere_types::Document::new();
    doc.insert("snippet".into(), json!(text));
    doc
}

/// Resolve an image argument to something the API accepts: URLs and
/// `data:` URIs pass through, local files are inlined as base64.
pub fn image_reference(arg: &str) -> Result<String> {
    if arg.starts_with("http://") || arg.starts_with("https://") || arg.starts_with("data:") {
        return Ok(arg.to_string());
    }
    let path = Path::new(arg);
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image {arg}"))?;
    Ok(format!(
        "data:{};base64,{}",
        image_mime(path)?,
        STANDARD.encode(bytes)
    ))
}

fn image_mime(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    Ok(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        other => bail!("Unsupported image type '{other}' (expected png, jpeg, gif or webp)"),
    })
}
