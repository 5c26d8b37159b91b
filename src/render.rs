// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! One-shot template rendering.
//!
//! Render a template against an implicit empty context, with block trimming
//! enabled so control structures do not leave blank lines behind. Used as a
//! stdin-to-stdout filter: the caller owns all I/O.

use minijinja::{context, Environment};

/// Render a template string against an empty context.
///
/// Block tags are trimmed (`trim_blocks`) and leading whitespace before them
/// is stripped (`lstrip_blocks`). Undefined lookups render as empty text
/// rather than failing, which lets the same template run with or without a
/// surrounding data source.
///
/// # Errors
///
/// - Return [`RenderError::Template`] if the template fails to parse or
///   render.
pub fn render_str(source: &str) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);

    let template = env.template_from_str(source).map_err(RenderError::Template)?;
    template.render(context! {}).map_err(RenderError::Template)
}

/// Template rendering error types.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template failed to parse or render.
    #[error(transparent)]
    Template(#[from] minijinja::Error),
}

/// Friendly result alias :3
pub type Result<T, E = RenderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_expressions() -> anyhow::Result<()> {
        let result = render_str("{{ 1 + 1 }} plus {{ 'text' | upper }}")?;
        assert_eq!(result, "2 plus TEXT");
        Ok(())
    }

    #[test]
    fn trims_block_lines() -> anyhow::Result<()> {
        let source = indoc! {"
            {% if true %}
            kept line
            {% endif %}
        "};

        let result = render_str(source)?;

        assert_eq!(result, "kept line\n");
        Ok(())
    }

    #[test]
    fn renders_undefined_lookups_as_empty() -> anyhow::Result<()> {
        let result = render_str("[{{ missing }}]")?;
        assert_eq!(result, "[]");
        Ok(())
    }

    #[test]
    fn reports_syntax_errors() {
        let result = render_str("{% if %}");
        assert!(matches!(result, Err(RenderError::Template(_))));
    }
}
