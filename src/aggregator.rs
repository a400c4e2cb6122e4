//! Summary aggregation strategies.
//!
//! Both strategies start from a bulk listing of passes. [summarize_fast] reduces the listing
//! directly, while [summarize_slow] fetches every listed pass again, one request at a time, before
//! reducing. The latter exists to make the cost of the N+1 request pattern visible in traces.
//!
//! [summarize_slow] sums the ascent of the re-fetched passes, not the listed ones. If the pass API
//! data changes between the listing and the individual requests the two strategies will disagree.

use crate::error::PassSummaryError;
use crate::models::{Method, Pass, Summary};
use crate::upstream::PassSource;

/// Summarise a collection of passes as listed.
///
/// # Arguments
///
/// * `passes`: Passes returned by a bulk fetch
pub fn summarize_fast(passes: &[Pass]) -> Summary {
    let total_ascent = passes.iter().map(|pass| u64::from(pass.ascent)).sum();
    Summary::new(passes.len(), total_ascent, None)
}

/// Summarise a collection of passes by fetching each one again from `source`.
///
/// Requests are issued sequentially, one per listed pass. The first failure is returned and no
/// partial summary is produced.
///
/// # Arguments
///
/// * `source`: Source to fetch the individual passes from
/// * `passes`: Passes returned by a bulk fetch
#[tracing::instrument(level = "DEBUG", skip_all, fields(pass_count = passes.len()))]
pub async fn summarize_slow<S>(source: &S, passes: &[Pass]) -> Result<Summary, PassSummaryError>
where
    S: PassSource + Sync,
{
    let mut total_ascent = 0_u64;
    for pass in passes {
        let refetched = source.fetch_by_id(pass.id).await?;
        total_ascent += u64::from(refetched.ascent);
    }
    Ok(Summary::new(
        passes.len(),
        total_ascent,
        Some(Method::IndividualRequests),
    ))
}
