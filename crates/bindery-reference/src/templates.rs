//! Templates for rendering reference descriptor stubs.

use minijinja::{context, Environment};

/// Context for a single class or function stub.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemberContext {
    /// Title line, `module.Member`
    pub title: String,
    /// Dash underline matching the title length
    pub underline: String,
    /// Dotted module name the member belongs to
    pub module: String,
    /// Bare member name
    pub name: String,
}

impl MemberContext {
    /// Build the context for one member of a module.
    pub fn new(module: &str, name: &str) -> Self {
        let title = format!("{}.{}", module, name);
        let underline = "-".repeat(title.len());
        Self {
            title,
            underline,
            module: module.to_string(),
            name: name.to_string(),
        }
    }
}

/// Context for a module stub aggregating its member list.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModuleContext {
    /// Title line (the dotted module name)
    pub title: String,
    /// Dash underline matching the title length
    pub underline: String,
    /// Dotted module name
    pub module: String,
    /// Class names, lexicographically sorted
    pub classes: Vec<String>,
    /// Function names, lexicographically sorted
    pub functions: Vec<String>,
    /// Sorted classes followed by sorted functions, for the hidden toctree
    pub entries: Vec<String>,
}

impl ModuleContext {
    /// Build the context for a module stub.
    ///
    /// Member lists are sorted here so the rendered summary is stable
    /// regardless of manifest order.
    pub fn new(module: &str, classes: &[String], functions: &[String]) -> Self {
        let mut classes = classes.to_vec();
        classes.sort();
        let mut functions = functions.to_vec();
        functions.sort();

        let mut entries = classes.clone();
        entries.extend(functions.iter().cloned());

        Self {
            title: module.to_string(),
            underline: "-".repeat(module.len()),
            module: module.to_string(),
            classes,
            functions,
            entries,
        }
    }
}

/// Template engine for descriptor stubs.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new engine with the embedded stub templates.
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Stub files end with a newline; do not let the engine strip it.
        env.set_keep_trailing_newline(true);

        env.add_template_owned("class.rst".to_string(), CLASS_TEMPLATE.to_string())
            .expect("Failed to add class template");

        env.add_template_owned("function.rst".to_string(), FUNCTION_TEMPLATE.to_string())
            .expect("Failed to add function template");

        env.add_template_owned("module.rst".to_string(), MODULE_TEMPLATE.to_string())
            .expect("Failed to add module template");

        Self { env }
    }

    /// Render a class stub.
    pub fn render_class(&self, ctx: &MemberContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("class.rst")?;

        tmpl.render(context! {
            title => &ctx.title,
            underline => &ctx.underline,
            module => &ctx.module,
            name => &ctx.name,
        })
    }

    /// Render a function stub.
    pub fn render_function(&self, ctx: &MemberContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("function.rst")?;

        tmpl.render(context! {
            title => &ctx.title,
            underline => &ctx.underline,
            module => &ctx.module,
            name => &ctx.name,
        })
    }

    /// Render a module stub with its member summary and hidden toctree.
    pub fn render_module(&self, ctx: &ModuleContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("module.rst")?;

        tmpl.render(context! {
            title => &ctx.title,
            underline => &ctx.underline,
            module => &ctx.module,
            classes => &ctx.classes,
            functions => &ctx.functions,
            entries => &ctx.entries,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const CLASS_TEMPLATE: &str = r#"{{ title }}
{{ underline }}

.. currentmodule:: {{ module }}

.. autoclass:: {{ name }}
    :members:
    :undoc-members:
    :inherited-members:
"#;

const FUNCTION_TEMPLATE: &str = r#"{{ title }}
{{ underline }}

.. currentmodule:: {{ module }}

.. autofunction:: {{ name }}
"#;

// The section tags sit flush against the surrounding text so that empty
// member groups leave no blank lines behind.
const MODULE_TEMPLATE: &str = r#"{{ title }}
{{ underline }}

.. currentmodule:: {{ module }}
{% if classes %}
**Classes**

.. autosummary::

{% for name in classes %}    {{ name }}
{% endfor %}{% endif %}{% if functions %}
**Functions**

.. autosummary::

{% for name in functions %}    {{ name }}
{% endfor %}{% endif %}{% if entries %}
.. toctree::
    :hidden:

{% for name in entries %}    {{ name }} <{{ module }}.{{ name }}>
{% endfor %}{% endif %}"#;
