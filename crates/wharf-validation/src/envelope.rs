//! Persistence envelope pairing a wire code with its payload JSON.
//!
//! This is the shape that crosses process boundaries: the numeric code
//! lives in the envelope, never inside the payload, so older readers can
//! route on `code` without touching `data`.

use serde::{Deserialize, Serialize};

use crate::taxonomy::{RawCode, TaxonomyError, TaxonomyRegistry, TaxonomyVariant};

/// A persisted validation outcome: the wire code plus the payload exactly
/// as it was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEnvelope {
    pub code: RawCode,
    pub data: String,
}

impl ValidationEnvelope {
    pub fn new(code: RawCode, data: impl Into<String>) -> Self {
        Self {
            code,
            data: data.into(),
        }
    }

    /// Capture a variant for persistence.
    pub fn seal<V: TaxonomyVariant>(value: &V) -> Self {
        Self {
            code: value.raw_code(),
            data: value.encode(),
        }
    }

    /// Decode the envelope against a family registry. Unrecognized codes
    /// come back as the family's fallback variant; recognized codes with
    /// payloads that fail validation are hard errors.
    pub fn open<V: TaxonomyVariant>(
        &self,
        registry: &TaxonomyRegistry<V>,
    ) -> Result<V, TaxonomyError> {
        registry.decode(self.code, &self.data)
    }
}
