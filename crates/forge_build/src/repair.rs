//! Model-assisted source repair.

use std::sync::Arc;

use async_trait::async_trait;
use forge_model::ModelClient;
use tracing::debug;

use crate::diagnostics::BuildDiagnostic;
use crate::error::BuildResult;

/// Produces replacement source for a failed build attempt.
#[async_trait]
pub trait RepairRequester: Send + Sync {
    /// Request corrected source. `attempt` is the zero-based index of the
    /// failed attempt this repair responds to.
    async fn request_repair(
        &self,
        page_id: &str,
        source: &str,
        diagnostic: &BuildDiagnostic,
        attempt: u32,
    ) -> BuildResult<String>;
}

/// [`RepairRequester`] backed by a model client.
pub struct ModelRepairRequester {
    model: Arc<dyn ModelClient>,
}

impl ModelRepairRequester {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl RepairRequester for ModelRepairRequester {
    async fn request_repair(
        &self,
        page_id: &str,
        source: &str,
        diagnostic: &BuildDiagnostic,
        attempt: u32,
    ) -> BuildResult<String> {
        debug!(
            "Requesting {} repair for page {} (failed attempt {})",
            diagnostic.kind.label(),
            page_id,
            attempt + 1
        );
        let prompt = repair_prompt(source, diagnostic);
        Ok(self.model.repair_source(&prompt).await?)
    }
}

/// Render the repair prompt for a classified failure.
fn repair_prompt(source: &str, diagnostic: &BuildDiagnostic) -> String {
    let details = if diagnostic.details.is_empty() {
        "none"
    } else {
        diagnostic.details.as_str()
    };

    format!(
        "Fix the errors in the following React TypeScript component code:\n\
         \n\
         Error type: {kind}\n\
         Error message: {message}\n\
         Details: {details}\n\
         \n\
         Original code:\n\
         {source}\n\
         \n\
         Make sure the fixed code:\n\
         1. Fixes all syntax errors\n\
         2. Imports every module it uses correctly\n\
         3. Keeps the existing functionality and UI structure\n\
         4. Uses React and Tailwind CSS, not antd or other UI libraries\n\
         5. Follows TypeScript conventions\n\
         6. Contains only the complete fixed code, with no explanations or extra content\n\
         \n\
         Fixed code:\n",
        kind = diagnostic.kind.label(),
        message = diagnostic.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::classify;
    use forge_model::MockModel;

    #[tokio::test]
    async fn test_prompt_carries_classification_and_source() {
        let mock = MockModel::new().with_repair_response("fixed source");
        let requester = ModelRepairRequester::new(Arc::new(mock.clone()));
        let diagnostic = classify("Module not found: Error: Can't resolve 'antd' in '/src'");

        let fixed = requester
            .request_repair("page-1", "const broken = ;", &diagnostic, 0)
            .await
            .unwrap();
        assert_eq!(fixed, "fixed source");

        let calls = mock.get_method_calls("repair_source");
        assert_eq!(calls.len(), 1);
        let prompt = &calls[0].prompt;
        assert!(prompt.contains("Error type: dependency"));
        assert!(prompt.contains("Cannot find module: antd"));
        assert!(prompt.contains("const broken = ;"));
        assert!(prompt.contains("Fixed code:"));
    }

    #[tokio::test]
    async fn test_model_failures_propagate() {
        let mock = MockModel::new().with_repair_failure("model offline");
        let requester = ModelRepairRequester::new(Arc::new(mock));
        let diagnostic = classify("SyntaxError: oops");

        let result = requester
            .request_repair("page-1", "src", &diagnostic, 1)
            .await;
        assert!(result.is_err());
    }
}
