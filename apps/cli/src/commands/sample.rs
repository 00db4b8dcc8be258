//! Sample request command implementation.

use cml_pipeline::sample_request;

/// Print the sample inference request body.
pub fn execute(compact: bool) -> anyhow::Result<()> {
    let request = sample_request();
    let body = if compact {
        serde_json::to_string(&request)?
    } else {
        serde_json::to_string_pretty(&request)?
    };
    println!("{body}");
    Ok(())
}
