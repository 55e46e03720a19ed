//! Superlists Functional Test Framework
//!
//! This crate provides a Rust-controlled functional testing framework that:
//! - Spawns the web application as a subprocess
//! - Drives a real browser through Playwright-generated scripts
//! - Parses declarative YAML test specs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Functional Test Runner (Rust)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> ServerHandle                       │
//! │    ├── run_spec(spec) -> TestResult  (one browser session)  │
//! │    └── write_results(suite) -> test-results.json            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags, viewport                    │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── fill { selector, value }                       │
//! │          ├── press { selector?, key }                       │
//! │          ├── wait { selector, timeout_ms }                  │
//! │          ├── assert_title { contains }                      │
//! │          ├── assert { selector, text?, attribute?, count? } │
//! │          └── screenshot { name }                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod error;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use runner::TestRunner;
pub use spec::{TestSpec, TestStep};
