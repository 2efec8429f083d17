//! Example demonstrating the two provider shapes
//!
//! A provider either implements a capability trait on its own type, or hands
//! a plain closure to `FnHandler`. Both end up behind the same trait object.

use async_trait::async_trait;
use sdk::{CapabilityError, CapabilityResult, FnHandler, Parser};
use serde_json::{json, Value};
use std::path::Path;

/// Parser that reads a file as newline-separated records
struct LineParser;

#[async_trait]
impl Parser for LineParser {
    async fn parse(&self, file_path: &Path) -> CapabilityResult<Value> {
        let contents = std::fs::read_to_string(file_path)?;
        let rows: Vec<Value> = contents.lines().map(|l| json!(l)).collect();
        Ok(json!({ "rows": rows }))
    }
}

#[tokio::main]
async fn main() {
    let parsers: Vec<(&str, Box<dyn Parser>)> = vec![
        ("struct", Box::new(LineParser)),
        (
            "closure",
            Box::new(FnHandler::parser(|path: &Path| {
                if path.extension().is_none() {
                    return Err(CapabilityError::Format(
                        "file has no extension".to_string(),
                    ));
                }
                Ok(json!({ "path": path, "rows": [] }))
            })),
        ),
    ];

    for (shape, parser) in &parsers {
        match parser.parse(Path::new("/etc/hostname")).await {
            Ok(value) => println!("{} parser -> {}", shape, value),
            Err(e) => println!("{} parser failed: {}", shape, e),
        }
    }
}
