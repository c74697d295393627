//! Before/after pairing of the original and the latest processed result.

use crate::core::types::ProcessingResult;
use crate::resources::{ResourceHandle, ResourceTable};

/// Pairs the original handle with the latest processed result.
///
/// The original handle is set once and lives until the session closes.
/// Installing a new result revokes the superseded processed handle in the
/// same step; callers hold the session lock across `install` and any view
/// resolution, so consumers never observe an intermediate empty state.
#[derive(Debug)]
pub struct Comparison {
    original: Option<ResourceHandle>,
    processed: Option<ProcessingResult>,
}

impl Comparison {
    pub(crate) fn new(original: ResourceHandle) -> Self {
        Self {
            original: Some(original),
            processed: None,
        }
    }

    /// `None` only after the session has closed.
    pub fn original(&self) -> Option<&ResourceHandle> {
        self.original.as_ref()
    }

    pub fn processed(&self) -> Option<&ProcessingResult> {
        self.processed.as_ref()
    }

    /// Installs an authoritative result, revoking the one it supersedes.
    pub(crate) fn install(&mut self, result: ProcessingResult, table: &ResourceTable) {
        if let Some(previous) = self.processed.replace(result) {
            table.revoke(previous.handle);
        }
    }

    /// Revokes both slots. Idempotent.
    pub(crate) fn close(&mut self, table: &ResourceTable) {
        if let Some(previous) = self.processed.take() {
            table.revoke(previous.handle);
        }
        if let Some(original) = self.original.take() {
            table.revoke(original);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use crate::utils::ImageFormat;

    fn result_for(table: &ResourceTable, payload: &'static [u8]) -> ProcessingResult {
        ProcessingResult {
            handle: table.materialize(Bytes::from_static(payload), "image/png"),
            byte_size: payload.len() as u64,
            width: 10,
            height: 10,
            format: ImageFormat::PNG,
        }
    }

    #[test]
    fn install_revokes_superseded_result() {
        let table = ResourceTable::new();
        let original = table.materialize(Bytes::from_static(b"orig"), "image/jpeg");
        let mut comparison = Comparison::new(original);

        comparison.install(result_for(&table, b"first"), &table);
        assert_eq!(table.live(), 2);

        comparison.install(result_for(&table, b"second"), &table);
        assert_eq!(table.live(), 2);
        let current = comparison.processed().unwrap();
        assert_eq!(&table.open(current.handle()).unwrap().bytes[..], b"second");
    }

    #[test]
    fn close_revokes_everything() {
        let table = ResourceTable::new();
        let original = table.materialize(Bytes::from_static(b"orig"), "image/jpeg");
        let mut comparison = Comparison::new(original);
        comparison.install(result_for(&table, b"result"), &table);

        comparison.close(&table);
        assert_eq!(table.live(), 0);
        assert!(comparison.original().is_none());
        assert!(comparison.processed().is_none());

        // Second close is a no-op.
        comparison.close(&table);
        assert_eq!(table.live(), 0);
    }
}
