//! Many-to-many link calls issued after a primary write

use std::future::Future;

use awx_core::provider::{LinkReport, ProviderError, ProviderResult};
use log::{debug, warn};

use crate::api::ApiResult;

/// Link each of `ids` to `parent`, one call at a time and in order.
///
/// Stops at the first failure. Links already made stay in place; the
/// returned error carries a [`LinkReport`] naming the failed id.
pub async fn link_all<F, Fut>(
    parent: i64,
    relation: &str,
    ids: &[i64],
    mut link: F,
) -> ProviderResult<LinkReport>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = ApiResult<()>>,
{
    let mut report = LinkReport::new(parent.to_string(), relation);

    for (index, &id) in ids.iter().enumerate() {
        match link(id).await {
            Ok(()) => {
                debug!("Linked {} {} to {}", relation, id, parent);
                report.linked.push(id);
            }
            Err(e) => {
                warn!("Failed to link {} {} to {}: {}", relation, id, parent, e);
                report.failed = Some(id);
                report.skipped = ids[index + 1..].to_vec();
                return Err(ProviderError::partial_link(report).with_cause(e));
            }
        }
    }

    Ok(report)
}
