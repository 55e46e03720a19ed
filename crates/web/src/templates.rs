//! Template rendering
//!
//! Thin wrapper around a `minijinja::Environment` holding the application
//! templates. Templates are embedded at compile time, so rendering needs no
//! filesystem access at runtime.

use std::collections::BTreeMap;

use minijinja::{context, Environment};

/// Name of the home page template.
pub const HOME_TEMPLATE: &str = "home.html";

/// Context key the home template reads the submitted item from.
pub const NEW_ITEM_KEY: &str = "new_item_text";

/// Template registry and renderer.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Build the environment with all application templates registered.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(HOME_TEMPLATE, include_str!("../templates/home.html"))?;
        Ok(Self { env })
    }

    /// Render a template by name with an optional set of string bindings.
    ///
    /// `None` renders with an empty context. Rendering is pure: the same
    /// template and context always produce identical output.
    pub fn render(
        &self,
        name: &str,
        context: Option<&BTreeMap<String, String>>,
    ) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(name)?;
        match context {
            Some(vars) => template.render(vars),
            None => template.render(context! {}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> Templates {
        Templates::new().expect("templates should compile")
    }

    fn item_context(text: &str) -> BTreeMap<String, String> {
        let mut ctx = BTreeMap::new();
        ctx.insert(NEW_ITEM_KEY.to_string(), text.to_string());
        ctx
    }

    #[test]
    fn home_template_renders_page_skeleton() {
        let html = templates().render(HOME_TEMPLATE, None).unwrap();

        assert!(html.starts_with("<html>"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(html.contains("<title>To-Do Lists</title>"));
        assert!(html.contains("<h1>Your To-Do list</h1>"));
    }

    #[test]
    fn home_template_has_input_with_placeholder() {
        let html = templates().render(HOME_TEMPLATE, None).unwrap();

        assert!(html.contains(r#"id="id_new_item""#));
        assert!(html.contains(r#"placeholder="Enter a to-do item""#));
    }

    #[test]
    fn empty_context_renders_no_rows() {
        let html = templates().render(HOME_TEMPLATE, None).unwrap();

        assert!(html.contains(r#"id="id_list_table""#));
        assert!(!html.contains("<tr>"));
    }

    #[test]
    fn submitted_item_appears_as_first_row() {
        let html = templates()
            .render(HOME_TEMPLATE, Some(&item_context("Buy peacock feathers")))
            .unwrap();

        assert!(html.contains("<tr><td>1: Buy peacock feathers</td></tr>"));
    }

    #[test]
    fn item_text_is_html_escaped() {
        let html = templates()
            .render(HOME_TEMPLATE, Some(&item_context("<script>alert(1)</script>")))
            .unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let t = templates();
        let ctx = item_context("new item");

        let first = t.render(HOME_TEMPLATE, Some(&ctx)).unwrap();
        let second = t.render(HOME_TEMPLATE, Some(&ctx)).unwrap();
        assert_eq!(first, second);

        let empty_first = t.render(HOME_TEMPLATE, None).unwrap();
        let empty_second = t.render(HOME_TEMPLATE, None).unwrap();
        assert_eq!(empty_first, empty_second);
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(templates().render("missing.html", None).is_err());
    }
}
