//! The durable on-disk store collaborator's interface.
//!
//! The durable graph itself — the memory-mapped, append-only persistence
//! layer — is out of scope for this crate; a `memmap2`-backed paged file
//! reader is the idiomatic Rust shape such a store would take, but no
//! implementation lives here. This trait only
//! specifies the *interface* the core would drive it through, so
//! [`crate::db::ConnectionRegistry`]'s URI router is total over its
//! documented `kind` values even though the `durable` kind always fails
//! with [`crate::error::GraphError::UnsupportedFeature`].

use crate::error::Result;

/// Default region size for the memory-mapped paged reader: 1 GiB. Reads
/// straddling a region boundary, or reaching the tail, re-map on demand.
pub const DEFAULT_REGION_SIZE: u64 = 1 << 30;

/// Addresses a variable-size encoded object in the flat store by the byte
/// offset returned at write-time.
pub type FlatOffset = u64;

/// Addresses a fixed-width row in the records store by its row number.
pub type RecordId = u64;

/// Addresses one transaction's payload in the transaction store by its
/// record number.
pub type TxRecordId = u64;

/// The durable-store collaborator: three append-only files backing the
/// indexes, read through a memory-mapped paged reader.
///
/// - A **flat store** holds arbitrary-size encoded objects addressed by the
///   offset returned at write time.
/// - A **records store** holds fixed-width rows of 64-bit words.
/// - A **transaction store** holds, per record, a 64-bit timestamp followed
///   by the transaction payload in 64-bit words, indexed by record number.
///
/// Writes are append-only; reads never observe in-flight writes until
/// [`DurableStore::force`] is called.
pub trait DurableStore: Send + Sync {
    /// Appends `bytes` to the flat store, returning the offset it was
    /// written at.
    fn append_flat(&mut self, bytes: &[u8]) -> Result<FlatOffset>;

    /// Reads the flat-store object at `offset`. Fails with
    /// [`crate::error::GraphError::BeyondEndOfFile`] if `offset` is past the
    /// last force-visible write.
    fn read_flat(&self, offset: FlatOffset) -> Result<Vec<u8>>;

    /// Appends one fixed-width row of 64-bit words to the records store,
    /// returning its row id.
    fn append_record(&mut self, words: &[u64]) -> Result<RecordId>;

    /// Reads the fixed-width row at `id`.
    fn read_record(&self, id: RecordId) -> Result<Vec<u64>>;

    /// Appends one transaction's `(timestamp, payload)` pair to the
    /// transaction store, returning its record id.
    fn append_transaction(&mut self, timestamp: u64, payload: &[u64]) -> Result<TxRecordId>;

    /// Reads the `(timestamp, payload)` pair at `id`. Fails with
    /// [`crate::error::GraphError::CorruptedTransactionFile`] if the record's
    /// framing is invalid.
    fn read_transaction(&self, id: TxRecordId) -> Result<(u64, Vec<u64>)>;

    /// Makes every write issued so far visible to subsequent reads.
    fn force(&mut self) -> Result<()>;

    /// The paged reader's region size (1 GiB by default).
    fn region_size(&self) -> u64 {
        DEFAULT_REGION_SIZE
    }
}
