//! Built-in tools available to every agent

mod search_internet;
mod summary;
mod verify_on_platform;

use std::sync::Arc;

pub use search_internet::SearchInternetTool;
pub use summary::{SummaryTool, SUMMARY_MODEL};
pub use verify_on_platform::{
    format_report, lookup, Verdict, VerificationRecord, VerifyOnPlatformTool, PLATFORM_RECORDS,
};

use super::tool::Tool;

/// Names of the built-in tools, in registration order
pub const BUILTIN_TOOL_NAMES: [&str; 3] =
    ["search_internet", "summary_long_text", "verify_on_platform"];

/// The built-in tool set, summarizing with `summary`
pub fn builtin_tools(summary: SummaryTool) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SearchInternetTool::new()),
        Arc::new(summary),
        Arc::new(VerifyOnPlatformTool::new()),
    ]
}
