//! Post-transfer row count reconciliation.

use tracing::info;

use crate::catalog::TargetStore;
use crate::error::{MigrateError, Result};

/// Compare the target's actual `COUNT(*)` against the pipeline's
/// authoritative transferred-row counter (not the pre-transfer estimate,
/// which is approximate by design).
///
/// A mismatch is a distinct failure mode from a failed transfer: the data is
/// already committed, so nothing is rolled back and the error carries its
/// own exit status at the process boundary.
pub async fn reconcile(
    target: &mut dyn TargetStore,
    table: &str,
    transferred: u64,
) -> Result<()> {
    let actual = target.count(table).await?;
    if actual != transferred {
        return Err(MigrateError::Verification {
            table: table.to_string(),
            transferred,
            actual,
        });
    }

    info!(table, rows = actual, "verification passed");
    Ok(())
}
