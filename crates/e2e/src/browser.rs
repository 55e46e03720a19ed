//! Playwright browser automation
//!
//! Compiles the steps of a test spec into a single Playwright script and runs
//! it with `node`. All steps share one page, so state created by earlier steps
//! (a filled input, a form submission reload) is visible to later ones.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::spec::{AttributeAssertion, TestStep, WaitState};

/// Browser automation handle
pub struct BrowserHandle {
    /// Base URL of the server
    base_url: String,

    /// Directory for screenshots
    screenshot_dir: PathBuf,

    /// Viewport dimensions
    viewport_width: u32,
    viewport_height: u32,

    /// Browser type
    browser: Browser,

    /// Run without a visible browser window
    headless: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Failure record emitted by a generated script on stderr
#[derive(Debug, Deserialize)]
struct ScriptFailure {
    success: bool,
    #[serde(default)]
    step: String,
    #[serde(default)]
    error: String,
}

/// Find the failure record in a script's stderr, if any. Records with
/// `success: true` are not failures and are skipped.
fn parse_script_failure(stderr: &str) -> Option<ScriptFailure> {
    stderr
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str::<ScriptFailure>(line).ok())
        .find(|record| !record.success)
}

impl BrowserHandle {
    /// Create a new browser handle
    pub fn new(config: BrowserConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self {
            base_url: config.base_url,
            screenshot_dir: config.screenshot_dir,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            browser: config.browser,
            headless: config.headless,
        })
    }

    /// Check that node can resolve the playwright module
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("node")
            .args(["-e", "require('playwright')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Run a sequence of steps as one browser session
    pub async fn run(&self, steps: &[TestStep]) -> E2eResult<()> {
        let script = self.build_script(steps);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("functional.js");
        std::fs::write(&script_path, &script)?;

        debug!("Running browser script: {}", script_path.display());

        // Run from the invoking directory so node resolves the local
        // playwright install.
        let output = TokioCommand::new("node").arg(&script_path).output().await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(failure) = parse_script_failure(&stderr) {
            return Err(E2eError::StepFailed {
                step: failure.step,
                reason: failure.error,
            });
        }

        Err(E2eError::Script(stderr.into_owned()))
    }

    /// Generate a display name for a step
    pub fn step_name(step: &TestStep) -> String {
        match step {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Fill { selector, .. } => format!("fill:{}", selector),
            TestStep::Press { key, .. } => format!("press:{}", key),
            TestStep::Wait { selector, .. } => format!("wait:{}", selector),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::AssertTitle { .. } => "assert:title".to_string(),
            TestStep::Assert { selector, .. } => format!("assert:{}", selector),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
        }
    }

    /// Build the Playwright script for a set of steps
    pub fn build_script(&self, steps: &[TestStep]) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};
  let currentStep = 'setup';

  try {{
"#,
            browser = self.browser.as_str(),
            headless = self.headless,
            width = self.viewport_width,
            height = self.viewport_height,
            base_url = js_str(&self.base_url),
        ));

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!(
                "\n    // Step {}: {}\n    currentStep = {};\n",
                i + 1,
                Self::step_name(step),
                js_str(&Self::step_name(step))
            ));
            script.push_str(&self.step_to_js(step));
        }

        script.push_str(
            r#"
    console.log(JSON.stringify({ success: true }));
  } catch (error) {
    console.error(JSON.stringify({ success: false, step: currentStep, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &TestStep) -> String {
        match step {
            TestStep::Navigate {
                url,
                wait_for_selector,
            } => {
                let mut js = format!("    await page.goto(baseUrl + {});\n", js_str(url));
                if let Some(selector) = wait_for_selector {
                    js.push_str(&format!(
                        "    await page.waitForSelector({});\n",
                        js_str(selector)
                    ));
                }
                js
            }
            TestStep::Fill { selector, value } => {
                format!(
                    "    await page.fill({}, {});\n",
                    js_str(selector),
                    js_str(value)
                )
            }
            TestStep::Press { selector, key } => match selector {
                Some(selector) => format!(
                    "    await page.locator({}).press({});\n",
                    js_str(selector),
                    js_str(key)
                ),
                None => format!("    await page.keyboard.press({});\n", js_str(key)),
            },
            TestStep::Wait {
                selector,
                timeout_ms,
                state,
            } => {
                let state = match state {
                    WaitState::Visible => "visible",
                    WaitState::Hidden => "hidden",
                    WaitState::Attached => "attached",
                    WaitState::Detached => "detached",
                };
                format!(
                    "    await page.waitForSelector({}, {{ state: '{}', timeout: {} }});\n",
                    js_str(selector),
                    state,
                    timeout_ms
                )
            }
            TestStep::Sleep { ms } => {
                format!("    await page.waitForTimeout({});\n", ms)
            }
            TestStep::AssertTitle { contains } => {
                format!(
                    r#"    {{
      const title = await page.title();
      if (!title.includes({expected})) {{
        throw new Error('title "' + title + '" does not contain ' + {expected});
      }}
    }}
"#,
                    expected = js_str(contains)
                )
            }
            TestStep::Assert {
                selector,
                visible,
                text,
                text_contains,
                attribute,
                count,
            } => self.assert_to_js(selector, *visible, text.as_deref(), text_contains.as_deref(), attribute.as_ref(), *count),
            TestStep::Screenshot { name, full_page } => {
                let path = self.screenshot_dir.join(format!("{}.png", name));
                format!(
                    "    await page.screenshot({{ path: {}, fullPage: {} }});\n",
                    js_str(&path.to_string_lossy()),
                    full_page
                )
            }
        }
    }

    /// Generate the body of an element assertion
    fn assert_to_js(
        &self,
        selector: &str,
        visible: Option<bool>,
        text: Option<&str>,
        text_contains: Option<&str>,
        attribute: Option<&AttributeAssertion>,
        count: Option<usize>,
    ) -> String {
        let sel = js_str(selector);
        let mut js = format!("    {{\n      const el = page.locator({});\n", sel);

        if let Some(expected) = count {
            js.push_str(&format!(
                r#"      const count = await el.count();
      if (count !== {expected}) {{
        throw new Error({sel} + ' matched ' + count + ' element(s), expected {expected}');
      }}
"#
            ));
        }

        if let Some(expected_visible) = visible {
            if expected_visible {
                js.push_str(&format!(
                    r#"      if (!(await el.isVisible())) {{
        throw new Error({sel} + ' is not visible');
      }}
"#
                ));
            } else {
                js.push_str(&format!(
                    r#"      if (await el.isVisible()) {{
        throw new Error({sel} + ' is unexpectedly visible');
      }}
"#
                ));
            }
        }

        if text.is_some() || text_contains.is_some() {
            js.push_str("      const actual = ((await el.first().textContent()) || '').trim();\n");
        }

        if let Some(expected) = text {
            js.push_str(&format!(
                r#"      if (actual !== {expected}) {{
        throw new Error({sel} + ' text "' + actual + '" != ' + {expected});
      }}
"#,
                expected = js_str(expected)
            ));
        }

        if let Some(expected) = text_contains {
            js.push_str(&format!(
                r#"      if (!actual.includes({expected})) {{
        throw new Error({sel} + ' text "' + actual + '" does not contain ' + {expected});
      }}
"#,
                expected = js_str(expected)
            ));
        }

        if let Some(attr) = attribute {
            js.push_str(&format!(
                "      const attr = (await el.first().getAttribute({})) || '';\n",
                js_str(&attr.name)
            ));
            if let Some(expected) = &attr.value {
                js.push_str(&format!(
                    r#"      if (attr !== {expected}) {{
        throw new Error({sel} + ' attribute {name} "' + attr + '" != ' + {expected});
      }}
"#,
                    expected = js_str(expected),
                    name = attr.name
                ));
            }
            if let Some(expected) = &attr.contains {
                js.push_str(&format!(
                    r#"      if (!attr.includes({expected})) {{
        throw new Error({sel} + ' attribute {name} "' + attr + '" does not contain ' + {expected});
      }}
"#,
                    expected = js_str(expected),
                    name = attr.name
                ));
            }
        }

        js.push_str("    }\n");
        js
    }
}

/// Quote a string as a single-quoted JavaScript literal
fn js_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Configuration for browser automation
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> BrowserHandle {
        // Bypasses the playwright install check; script generation needs no node.
        BrowserHandle {
            base_url: "http://127.0.0.1:8000".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
        }
    }

    #[test]
    fn js_str_escapes_quotes_and_backslashes() {
        assert_eq!(js_str("plain"), "'plain'");
        assert_eq!(js_str("it's"), r"'it\'s'");
        assert_eq!(js_str(r"a\b"), r"'a\\b'");
        assert_eq!(js_str("line\nbreak"), r"'line\nbreak'");
    }

    #[test]
    fn script_runs_all_steps_in_one_session() {
        let steps = vec![
            TestStep::Navigate {
                url: "/".to_string(),
                wait_for_selector: Some("#id_new_item".to_string()),
            },
            TestStep::Fill {
                selector: "#id_new_item".to_string(),
                value: "Buy peacock feathers".to_string(),
            },
            TestStep::Press {
                selector: Some("#id_new_item".to_string()),
                key: "Enter".to_string(),
            },
        ];

        let script = handle().build_script(&steps);

        // One browser launch, one page, all steps inline.
        assert_eq!(script.matches("chromium.launch").count(), 1);
        assert_eq!(script.matches("context.newPage").count(), 1);
        assert!(script.contains("await page.goto(baseUrl + '/');"));
        assert!(script.contains("await page.fill('#id_new_item', 'Buy peacock feathers');"));
        assert!(script.contains("await page.locator('#id_new_item').press('Enter');"));
    }

    #[test]
    fn assertion_steps_name_the_failing_step() {
        let steps = vec![TestStep::Assert {
            selector: "#id_list_table tr".to_string(),
            visible: None,
            text: Some("1: Buy peacock feathers".to_string()),
            text_contains: None,
            attribute: None,
            count: Some(1),
        }];

        let script = handle().build_script(&steps);

        assert!(script.contains("currentStep = 'assert:#id_list_table tr';"));
        assert!(script.contains("const count = await el.count();"));
        assert!(script.contains("if (count !== 1)"));
        assert!(script.contains("if (actual !== '1: Buy peacock feathers')"));
    }

    #[test]
    fn attribute_assertion_checks_exact_value() {
        let steps = vec![TestStep::Assert {
            selector: "#id_new_item".to_string(),
            visible: None,
            text: None,
            text_contains: None,
            attribute: Some(AttributeAssertion {
                name: "placeholder".to_string(),
                value: Some("Enter a to-do item".to_string()),
                contains: None,
            }),
            count: None,
        }];

        let script = handle().build_script(&steps);

        assert!(script.contains("getAttribute('placeholder')"));
        assert!(script.contains("if (attr !== 'Enter a to-do item')"));
    }

    #[test]
    fn failure_records_are_parsed_from_stderr() {
        let stderr = concat!(
            "some unrelated log line\n",
            r#"{"success":false,"step":"assert:#id_list_table tr","error":"text mismatch"}"#,
            "\n",
        );

        let failure = parse_script_failure(stderr).expect("failure record should parse");
        assert_eq!(failure.step, "assert:#id_list_table tr");
        assert_eq!(failure.error, "text mismatch");
    }

    #[test]
    fn success_records_are_not_failures() {
        assert!(parse_script_failure(r#"{"success":true}"#).is_none());
        assert!(parse_script_failure("not json at all").is_none());
    }

    #[test]
    fn values_are_escaped_before_interpolation() {
        let steps = vec![TestStep::Fill {
            selector: "#id_new_item".to_string(),
            value: "it's a 'quoted' item".to_string(),
        }];

        let script = handle().build_script(&steps);
        assert!(script.contains(r"'it\'s a \'quoted\' item'"));
    }
}
