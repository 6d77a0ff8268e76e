//! Artifact templates for synthesized components, rendered with Handlebars.

use handlebars::Handlebars;
use serde_json::json;

use forgeflow_core::ComponentKind;

/// Template loader error types
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template registration failed: {0}")]
    RegistrationFailed(#[from] handlebars::TemplateError),

    #[error("Template rendering failed: {0}")]
    RenderingFailed(#[from] handlebars::RenderError),
}

/// Embedded artifact templates, one per component kind.
pub struct TemplateLoader {
    handlebars: Handlebars<'static>,
}

impl TemplateLoader {
    pub fn new() -> Result<Self, TemplateError> {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        // Artifacts are Rust source, not HTML.
        hbs.register_escape_fn(handlebars::no_escape);

        hbs.register_template_string("tool", include_str!("../templates/tool.rs.hbs"))?;
        hbs.register_template_string("agent", include_str!("../templates/agent.rs.hbs"))?;
        hbs.register_template_string("team", include_str!("../templates/team.rs.hbs"))?;

        Ok(Self { handlebars: hbs })
    }

    /// Render the artifact for a component of `kind`.
    ///
    /// `body` is inserted verbatim as the tool's `run` body or the agent's
    /// `process` body; teams ignore it.
    pub fn render(
        &self,
        kind: ComponentKind,
        name: &str,
        goal: &str,
        body: &str,
    ) -> Result<String, TemplateError> {
        let data = json!({
            "name": name,
            "goal": goal.replace('"', "'"),
            "body": body,
        });
        Ok(self.handlebars.render(kind.as_str(), &data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_initialization() {
        assert!(TemplateLoader::new().is_ok());
    }

    #[test]
    fn test_render_tool_inserts_body_unescaped() {
        let loader = TemplateLoader::new().unwrap();
        let out = loader
            .render(ComponentKind::Tool, "Shouter", "shout \"loudly\"", "        return Ok(input);")
            .unwrap();
        assert!(out.contains("pub struct Shouter;"));
        assert!(out.contains("return Ok(input);"));
        assert!(out.contains("Auto-generated tool: shout 'loudly'"));
        assert!(out.contains("ComponentKind::Tool"));
    }

    #[test]
    fn test_render_agent_and_team() {
        let loader = TemplateLoader::new().unwrap();
        let agent = loader
            .render(ComponentKind::Agent, "Helper", "help", "        return Ok(input);")
            .unwrap();
        assert!(agent.contains("fn process(&self, input: Value)"));
        assert!(agent.contains("\"agent\": \"Helper\""));

        let team = loader.render(ComponentKind::Team, "PairTeam", "pair up", "").unwrap();
        assert!(team.contains("impl Team for PairTeam"));
    }
}
