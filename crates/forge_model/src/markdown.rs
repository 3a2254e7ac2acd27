//! Extraction of source code from fenced model completions.

use regex::Regex;

/// Strip a markdown code fence wrapping a completion.
///
/// Models frequently return the component wrapped in a
/// ` ```typescript ` or ` ```tsx ` block even when asked not to. A
/// language-tagged fence is tried first, then a bare fence; content
/// without a recognized fence is returned trimmed and unchanged.
pub fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(re) = Regex::new(r"(?is)```(?:typescript|tsx)\s*\n(.*?)\n```$") {
        if let Some(caps) = re.captures(trimmed) {
            return caps[1].trim().to_string();
        }
    }

    if let Ok(re) = Regex::new(r"(?s)^```\s*\n(.*?)\n```$") {
        if let Some(caps) = re.captures(trimmed) {
            return caps[1].trim().to_string();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_typescript_fence() {
        let completion = "```typescript\nconst App = () => <div />;\nexport default App;\n```";
        assert_eq!(
            strip_code_fences(completion),
            "const App = () => <div />;\nexport default App;"
        );
    }

    #[test]
    fn test_strips_tsx_fence_case_insensitively() {
        let completion = "```TSX\nexport default function App() { return null; }\n```";
        assert_eq!(
            strip_code_fences(completion),
            "export default function App() { return null; }"
        );
    }

    #[test]
    fn test_strips_bare_fence() {
        let completion = "```\nlet x = 1;\n```";
        assert_eq!(strip_code_fences(completion), "let x = 1;");
    }

    #[test]
    fn test_drops_preamble_before_tagged_fence() {
        // The tagged pattern is not anchored at the start, so a preamble
        // before the block is dropped along with the fence.
        let completion = "Here is the component:\n```tsx\nconst a = 1;\n```";
        assert_eq!(strip_code_fences(completion), "const a = 1;");
    }

    #[test]
    fn test_unfenced_content_passes_through() {
        let completion = "  export default function App() { return null; }  ";
        assert_eq!(
            strip_code_fences(completion),
            "export default function App() { return null; }"
        );
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(strip_code_fences(""), "");
        assert_eq!(strip_code_fences("   \n  "), "");
    }
}
