use crate::config::config::Config;
use crate::error::DimmerResult;
use schemars::{schema_for, Schema};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const HEADER: &str = "# Dimmer Configuration File\n# Missing fields are filled in with their defaults\n\n";

pub fn serialize_config(config: &Config, path: &Path) -> DimmerResult<()> {
    fs::write(path, documented_yaml(config)?)?;
    Ok(())
}

/// The config as YAML, each field preceded by its doc comment.
pub fn documented_yaml(config: &Config) -> DimmerResult<String> {
    let yaml = serde_yaml::to_string(config)?;
    let field_docs = field_documentation(&schema_for!(Config));

    let mut output = String::from(HEADER);
    output.push_str(&add_comments_to_yaml(&yaml, &field_docs));
    output.push('\n');
    Ok(output)
}

fn field_documentation(schema: &Schema) -> HashMap<String, String> {
    let Some(properties) = schema
        .as_object()
        .and_then(|schema| schema.get("properties"))
        .and_then(|properties| properties.as_object())
    else {
        return HashMap::new();
    };

    properties
        .iter()
        .filter_map(|(key, property)| {
            let description = property.as_object()?.get("description")?.as_str()?;
            Some((key.clone(), description.to_string()))
        })
        .collect()
}

fn add_comments_to_yaml(yaml: &str, field_docs: &HashMap<String, String>) -> String {
    let mut result: Vec<String> = Vec::new();

    for line in yaml.lines() {
        let is_top_level = !line.starts_with(' ') && !line.starts_with('-');
        let doc = line
            .split_once(':')
            .filter(|_| is_top_level)
            .and_then(|(field, _)| field_docs.get(field.trim()));

        if let Some(doc) = doc {
            if !result.is_empty() {
                result.push(String::new());
            }
            result.push(format!("# {doc}"));
        }
        result.push(line.to_string());
    }

    result.join("\n")
}
