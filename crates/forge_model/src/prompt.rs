//! Prompt construction for page generation and titles.

use forge_pages::PageKind;

/// System prompt for title generation.
pub(crate) const TITLE_SYSTEM_PROMPT: &str = "You are a creative title generator. \
Based on the user's page requirements and page type, generate a concise, \
descriptive title (2 to 6 words) that accurately reflects the page content \
and purpose.";

/// System prompt for code repair.
pub(crate) const REPAIR_SYSTEM_PROMPT: &str = "You are a professional front-end \
development expert who fixes errors in React TypeScript code.";

const BASE_SYSTEM_PROMPT: &str = "You are an expert React developer. Generate \
clean, modern React TypeScript components using React hooks. The component \
should be a default export named App. Create beautiful, responsive designs \
with modern UI components. Use either Tailwind CSS classes (preferred) or \
inline styles for styling. Do not use external CSS files or CSS modules.";

/// System prompt for page generation, specialized per page kind.
pub(crate) fn page_system_prompt(kind: PageKind) -> String {
    let focus = match kind {
        PageKind::H5 => {
            "Focus on mobile-first responsive design with touch-friendly \
             interfaces. Prioritize mobile UX patterns and touch targets."
        }
        PageKind::Admin => {
            "Create professional admin dashboard layouts with data tables, \
             charts, and management interfaces. Ensure proper spacing and \
             information hierarchy for complex data."
        }
        PageKind::Pc => {
            "Design desktop-optimized layouts with comprehensive functionality \
             and professional styling. Leverage wider screen real estate \
             appropriately."
        }
    };
    format!("{BASE_SYSTEM_PROMPT} {focus}")
}

/// User message for page generation, optionally carrying the current source
/// for the model to modify.
pub(crate) fn page_user_prompt(prompt: &str, current_source: Option<&str>) -> String {
    let mut message = format!(
        "(/no_think)Generate a React TypeScript component for the following requirements: {prompt}"
    );

    if let Some(source) = current_source {
        message.push_str(&format!(
            "\n\nCurrent code (modify this):\n```typescript\n{source}\n```"
        ));
    }

    message.push_str(
        "\n\nRequirements:\n\
         - Export as default function named App\n\
         - Use TypeScript\n\
         - Import React and any hooks you use\n\
         - Use either Tailwind CSS classes (preferred) or inline styles for styling\n\
         - Do not use external CSS files or CSS modules\n\
         - Return only the complete React component code, wrapped in markdown \
         code blocks like ```typescript. No explanations needed.",
    );

    message
}

/// User message for title generation.
pub(crate) fn title_prompt(prompt: &str, kind: PageKind) -> String {
    let audience = match kind {
        PageKind::H5 => "mobile",
        PageKind::Admin => "admin dashboard",
        PageKind::Pc => "desktop",
    };
    format!(
        "(/no_think)Please generate a suitable title for this {audience} page \
         requirement: \"{prompt}\".\n\n\
         Return only the title text, no explanations or quotes. Title should be:\n\
         - 2 to 6 words\n\
         - Descriptive and accurate\n\
         - Professional and engaging\n\
         - Suitable for the page type"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_specializes_per_kind() {
        let h5 = page_system_prompt(PageKind::H5);
        let admin = page_system_prompt(PageKind::Admin);

        assert!(h5.starts_with(BASE_SYSTEM_PROMPT));
        assert!(h5.contains("mobile-first"));
        assert!(admin.contains("admin dashboard"));
        assert_ne!(h5, admin);
    }

    #[test]
    fn test_user_prompt_embeds_current_source() {
        let without = page_user_prompt("a login form", None);
        assert!(!without.contains("Current code"));

        let with = page_user_prompt("a login form", Some("const x = 1;"));
        assert!(with.contains("Current code (modify this):"));
        assert!(with.contains("const x = 1;"));
    }
}
