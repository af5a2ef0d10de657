pub(crate) mod openai;

pub use openai::{ChatClassifier, Classifier};

use indoc::formatdoc;

use crate::server_config::Category;

/// System prompt instructing the model to label a batch of search queries
/// with the configured taxonomy. The model must echo the batch back as a
/// JSON array with a `category` field added to every entry.
pub fn system_prompt(categories: &[Category]) -> String {
    let taxonomy = categories
        .iter()
        .map(|c| format!(" - {}: {}.", c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n");

    formatdoc! {r#"
        You are given a list of user search query entries.
        Each entry is a JSON object with the following fields:
         - 'query': the search text
         - 'time': timestamp of the query

        Your task is to classify the query field of each object entry in the list into one of the predefined categories and return the same list of objects, but with an additional field called 'category' added to each object. The number of objects in the output must exactly match the number of objects in the input.

        Predefined taxonomy of categories:
        {taxonomy}

        You will only respond with the JSON array itself. Do not provide explanations or wrap the array in another object."#,
    taxonomy = taxonomy}
}

/// User prompt carrying one serialized sub-batch.
pub fn classification_user_prompt(items: &[serde_json::Value]) -> String {
    let lines = items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n");

    format!("Here is the batch of data items:\n\n{}", lines)
}
