//! A minimal strategy with a single widget lookup tool.

use std::sync::Arc;

use async_trait::async_trait;

use super::ChatStrategy;
use crate::error::Result;
use crate::tools::{FunctionTool, ToolFunction, ToolParameters};

const SYSTEM_PROMPT: &str = "You are a helpful assistant";

fn widgets(colour: &str) -> &'static [&'static str] {
    match colour {
        "red" => &[
            "Fire chilli widget",
            "Big stop sign widget",
            "Bursting heart widget",
        ],
        "yellow" => &["Hello sunshine widget", "Banana custard widget"],
        "green" => &["Slimey widget", "Fresh meadow widget", "Granny smith widget"],
        "purple" => &["Prince rain widget", "Hendrix haze widget"],
        _ => &[],
    }
}

fn get_widgets_tool() -> FunctionTool {
    FunctionTool::new(
        "getWidgets",
        "Return a list of widgets of a given colour",
        ToolParameters::object()
            .string("colour", "The colour of the desired widgets", true)
            .build(),
        |args| async move {
            let colour = args.get_str("colour")?;
            let found = widgets(colour);
            if found.is_empty() {
                return Ok(format!("No {colour} widgets found"));
            }
            Ok(format!("{colour} widgets: {}", found.join(", ")))
        },
    )
}

/// Plain continuous chat offering `getWidgets`.
pub struct DemoStrategy {
    tools: Vec<Arc<dyn ToolFunction>>,
}

impl DemoStrategy {
    pub fn new() -> Self {
        Self {
            tools: vec![Arc::new(get_widgets_tool())],
        }
    }
}

impl Default for DemoStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStrategy for DemoStrategy {
    fn tools(&self) -> Vec<Arc<dyn ToolFunction>> {
        self.tools.clone()
    }

    async fn system_prompt(&self) -> Result<String> {
        Ok(SYSTEM_PROMPT.to_string())
    }
}
