//! Origin classification for intent-aware requests.

use sourceset_domain::{Classification, OriginSpec, SourcesDescriptor};
use sourceset_shared::{ErrorEnvelope, Result, ResultExt};

/// Classify one intent. Contract violations surface as invariant errors.
pub fn classify_origin(origin: &OriginSpec) -> Result<Classification> {
    origin
        .classify()
        .map_err(ErrorEnvelope::from)
        .with_metadata("variant", origin.variant_name())
}

/// Classify every pair up front, so a malformed intent fails the request
/// before any file is captured.
pub fn classify_pairs(
    pairs: Vec<(SourcesDescriptor, OriginSpec)>,
) -> Result<Vec<(SourcesDescriptor, Classification)>> {
    pairs
        .into_iter()
        .map(|(descriptor, origin)| {
            let classification = classify_origin(&origin)
                .with_metadata_lazy("address", || descriptor.address.to_string())?;
            Ok((descriptor, classification))
        })
        .collect()
}
