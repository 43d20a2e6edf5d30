use kwa_core::{Citation, FileAuditRecord, FindingCode};
use tracing::warn;

/// Retrieval boundary. Implementations map a token's lookup key to supporting
/// or refuting documentation excerpts.
pub trait CitationSource: Send + Sync {
    fn lookup(&self, key: &str) -> anyhow::Result<Vec<Citation>>;
}

/// Rules-only runs: never returns anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCitations;

impl CitationSource for NoCitations {
    fn lookup(&self, _key: &str) -> anyhow::Result<Vec<Citation>> {
        Ok(vec![])
    }
}

/// Attach citations to every keyword token and to the `UNKNOWN_KEYWORD` findings
/// raised at the same location. Verdicts and severities are left alone.
pub fn enrich(record: &mut FileAuditRecord, source: &dyn CitationSource) {
    for token in &mut record.keywords {
        let citations = match source.lookup(&token.lookup_key) {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %record.file, key = %token.lookup_key, error = %e, "citation lookup failed");
                continue;
            }
        };
        if citations.is_empty() {
            continue;
        }
        let at = Some(token.location());
        for finding in record
            .findings
            .iter_mut()
            .filter(|f| f.code == FindingCode::UnknownKeyword && f.location == at)
        {
            finding.citations = citations.clone();
        }
        token.citations = citations;
    }
}
