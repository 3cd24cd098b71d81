use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of one dispatcher invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DispatchSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    /// Rows whose status could not be written back; they are picked up again
    /// once their claim lease runs out.
    pub write_errors: usize,
    /// Rows re-claimed by another invocation before this one wrote back.
    /// They are settled by whichever invocation holds the claim.
    pub lost_claims: usize,
}
