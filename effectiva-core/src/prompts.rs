//! System prompt assembly for the agents.

const REASONING_FRAMEWORK: &str = "\
<reasoning_framework>
You are an intelligent agent that thinks before acting.
When presented with a complex request, you MUST use the following reasoning process:
1. **Analyze**: Understand the user's intent, context, and constraints.
2. **Plan**: Formulate a step-by-step plan to address the request.
3. **Tool Selection**: Identify which tools (if any) are needed for each step.
4. **Execution**: Execute the plan, using tools as necessary.
5. **Reflection**: Verify if the result meets the user's needs.

You should output your reasoning process in a `<thought>` block before your final response if the task is complex.
</reasoning_framework>";

/// The pieces of an agent's system prompt.
#[derive(Debug, Clone, Default)]
pub struct PromptTemplate<'a> {
    pub role: &'a str,
    pub personality: &'a str,
    pub responsibilities: &'a [&'a str],
    pub approach: &'a [&'a str],
    pub tools_description: &'a str,
    pub communication_style: &'a [&'a str],
    pub additional: Option<&'a str>,
}

fn bullets(items: &[&str]) -> String {
    items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n")
}

fn section(name: &str, body: &str) -> String {
    format!("<{name}>\n{body}\n</{name}>")
}

impl PromptTemplate<'_> {
    /// Render the XML-sectioned prompt. Section order is fixed; the
    /// additional instructions, when present, come last.
    pub fn render(&self) -> String {
        let profile = format!(
            "<agent_profile>\n<role>{}</role>\n<personality>{}</personality>\n</agent_profile>",
            self.role, self.personality
        );
        let mut parts = vec![
            profile,
            section("responsibilities", &bullets(self.responsibilities)),
            section("approach", &bullets(self.approach)),
            section("tools_available", self.tools_description.trim()),
            section("communication_style", &bullets(self.communication_style)),
            REASONING_FRAMEWORK.to_string(),
        ];
        if let Some(extra) = self.additional.map(str::trim).filter(|s| !s.is_empty()) {
            parts.push(section("additional_instructions", extra));
        }
        parts.join("\n\n")
    }

    #[allow(clippy::too_many_arguments)]
    pub fn build(
        role: &str,
        personality: &str,
        responsibilities: &[&str],
        approach: &[&str],
        tools_description: &str,
        communication_style: &[&str],
        additional: Option<&str>,
    ) -> String {
        PromptTemplate {
            role,
            personality,
            responsibilities,
            approach,
            tools_description,
            communication_style,
            additional,
        }
        .render()
    }
}
