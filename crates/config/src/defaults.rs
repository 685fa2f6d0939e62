//! Built-in configuration defaults

use std::collections::HashMap;

use serde_json::{json, Value};

/// Returns the default configuration values
pub fn default_values() -> HashMap<String, Value> {
    let mut values = HashMap::new();

    // Base directory of the artifact tree (active/, inactive/, metadata.json)
    values.insert("model_base_path".to_string(), json!("./models"));

    // Required files at the root of every model bundle
    values.insert("weights_filename".to_string(), json!("best_model.pth"));
    values.insert("config_filename".to_string(), json!("config.json"));

    // A load exceeding this limit is treated as a load failure
    values.insert("load_timeout_secs".to_string(), json!(120));

    values.insert("log_level".to_string(), json!("info"));

    values
}
