//! Declarative YAML test specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::E2eResult;

/// A complete test specification parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Fill an input field
    Fill { selector: String, value: String },

    /// Press a key, optionally scoped to an element
    Press {
        #[serde(default)]
        selector: Option<String>,
        key: String,
    },

    /// Wait for an element to appear
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Assert on the page title
    AssertTitle { contains: String },

    /// Assert something about an element
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        attribute: Option<AttributeAssertion>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },
}

fn default_wait_timeout() -> u64 {
    5000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeAssertion {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
}

impl TestSpec {
    /// Parse a test spec from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all test specs from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submission_flow_spec() {
        let yaml = r#"
name: home-page
description: A visitor can submit a to-do item and see it listed
tags:
  - smoke
steps:
  - action: navigate
    url: /
    wait_for_selector: '#id_new_item'
  - action: fill
    selector: '#id_new_item'
    value: Buy peacock feathers
  - action: press
    selector: '#id_new_item'
    key: Enter
  - action: assert
    selector: '#id_list_table tr'
    count: 1
    text: '1: Buy peacock feathers'
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "home-page");
        assert_eq!(spec.steps.len(), 4);
        assert_eq!(spec.viewport.width, 1280);

        match &spec.steps[3] {
            TestStep::Assert { count, text, .. } => {
                assert_eq!(*count, Some(1));
                assert_eq!(text.as_deref(), Some("1: Buy peacock feathers"));
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn parses_title_and_attribute_assertions() {
        let yaml = r#"
name: layout
steps:
  - action: assert_title
    contains: To-Do
  - action: assert
    selector: '#id_new_item'
    attribute:
      name: placeholder
      value: Enter a to-do item
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();

        match &spec.steps[0] {
            TestStep::AssertTitle { contains } => assert_eq!(contains, "To-Do"),
            other => panic!("unexpected step: {:?}", other),
        }
        match &spec.steps[1] {
            TestStep::Assert {
                attribute: Some(attr),
                ..
            } => {
                assert_eq!(attr.name, "placeholder");
                assert_eq!(attr.value.as_deref(), Some("Enter a to-do item"));
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_action() {
        let yaml = r#"
name: broken
steps:
  - action: teleport
    url: /
"#;
        assert!(TestSpec::from_yaml(yaml).is_err());
    }
}
