//! Inline-script pattern strategy.
//!
//! Player and viewer state is often serialized into inline scripts rather
//! than markup. Each script body is truncated to `max_script_bytes` before the
//! URL regex runs over it.

use async_trait::async_trait;
use scraper::Html;

use super::scan::scan_scripts;
use super::{Collected, ExtractionStrategy, PartialExtraction, StrategyContext};
use crate::media::MediaType;

/// Regex-scans inline scripts for video and document URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptStrategy;

#[async_trait]
impl ExtractionStrategy for ScriptStrategy {
    fn name(&self) -> &'static str {
        "inline-script"
    }

    fn collect(&self, document: &Html, ctx: &StrategyContext) -> Collected {
        let mut partial = PartialExtraction::default();
        scan_scripts(
            document,
            ctx,
            &[MediaType::Video, MediaType::Document],
            &mut partial,
        );
        partial.into()
    }
}
