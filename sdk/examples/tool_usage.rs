//! Example demonstrating StepInput and the capability data types

use sdk::{Dataset, DownloadedFile, ResourceLink, StepInput};
use serde_json::json;

fn main() {
    // Example 1: Creating a StepInput with parameters
    let input = StepInput::new()
        .with_param("file_path", json!("/tmp/population.csv"))
        .with_param("keywords", json!(["population", "Île-de-France"]));

    println!("Created StepInput: {:?}", input);

    // Example 2: Extracting parameters
    match input.param_str("file_path") {
        Ok(path) => println!("File path parameter: {}", path),
        Err(e) => println!("Error: {}", e),
    }

    // Example 3: Missing parameters surface as step-level errors
    if let Err(e) = input.param_str("url") {
        println!("Expected error: {}", e);
    }

    // Example 4: Single strings and lists read the same way
    println!("Keywords: {:?}", input.param_str_list("keywords"));

    // Example 5: Dataset records as returned by a search provider
    let dataset = Dataset::new("pop-2023", "Population légale 2023")
        .with_resource(ResourceLink::new("https://example.com/pop.csv"));
    println!(
        "Dataset JSON: {}",
        serde_json::to_string_pretty(&dataset).unwrap_or_default()
    );

    // Example 6: Downloaded files expose a file_path field
    let file = DownloadedFile::new("/tmp/pop.csv");
    println!(
        "Downloaded file JSON: {}",
        serde_json::to_string(&file).unwrap_or_default()
    );
}
