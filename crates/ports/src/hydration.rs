//! Sources hydration boundary contract.

use crate::BoxFuture;
use sourceset_domain::{Snapshot, SourcesDescriptor};
use sourceset_shared::{RequestContext, Result};

/// Expands a descriptor's declared patterns into its captured owned files.
pub trait SourcesHydrationPort: Send + Sync {
    /// Return the descriptor's owned file set.
    ///
    /// A descriptor without declared sources hydrates to the empty snapshot.
    fn hydrate(
        &self,
        ctx: &RequestContext,
        descriptor: SourcesDescriptor,
    ) -> BoxFuture<'_, Result<Snapshot>>;
}
