use crate::{
    crypto::Address,
    rpc::LedgerReader,
    storage::{ArrayDescriptor, ArrayEncoding, ProjectionError, Slot, StoredElement, StructLayout, Word},
};
use futures::{stream, StreamExt};
use log::{debug, trace};
use primitive_types::U256;
use std::ops::Range;

use super::element_slot;

/// Fetch the words of element `index` and decode them through `layout`.
///
/// A transport failure aborts this element only and is never retried here.
pub async fn read_element<R: LedgerReader + ?Sized>(
    client: &R,
    address: &Address,
    base: Slot,
    index: u64,
    layout: &StructLayout,
) -> Result<StoredElement, ProjectionError> {
    let words_per_element = layout.words_per_element();
    let first = element_slot(base, index, words_per_element as u64);

    let mut words = Vec::with_capacity(words_per_element);
    for offset in 0..words_per_element {
        let slot = first.wrapping_add(U256::from(offset));
        let word = read_word(client, address, slot).await?;
        words.push(word);
    }

    Ok(layout.decode(&words)?)
}

async fn read_word<R: LedgerReader + ?Sized>(
    client: &R,
    address: &Address,
    slot: Slot,
) -> Result<Word, ProjectionError> {
    if log::log_enabled!(log::Level::Trace) {
        trace!("get_storage_at {} {}", address, slot);
    }

    client
        .get_storage_at(address, slot)
        .await
        .map_err(|source| ProjectionError::Transport {
            slot: slot.to_hex(),
            source,
        })
}

/// Read-only projection of one contract's array of structs.
///
/// Holds no client: the caller passes its RPC handle to every read and keeps
/// ownership of its lifecycle.
#[derive(Debug, Clone)]
pub struct StorageProjector {
    address: Address,
    descriptor: ArrayDescriptor,
    // Computed once, every element read starts from it
    base: Slot,
}

impl StorageProjector {
    pub fn new(address: Address, descriptor: ArrayDescriptor) -> Self {
        let base = descriptor.base_slot();
        Self {
            address,
            descriptor,
            base,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn descriptor(&self) -> &ArrayDescriptor {
        &self.descriptor
    }

    pub fn base(&self) -> Slot {
        self.base
    }

    pub fn element_slot(&self, index: u64) -> Slot {
        element_slot(self.base, index, self.descriptor.words_per_element())
    }

    pub async fn read_element<R: LedgerReader + ?Sized>(
        &self,
        client: &R,
        index: u64,
    ) -> Result<StoredElement, ProjectionError> {
        read_element(client, &self.address, self.base, index, &self.descriptor.layout).await
    }

    /// Number of elements: the word at the declaration slot for dynamic
    /// arrays, the declared length for fixed ones.
    pub async fn read_length<R: LedgerReader + ?Sized>(
        &self,
        client: &R,
    ) -> Result<u64, ProjectionError> {
        match self.descriptor.encoding {
            ArrayEncoding::Fixed { length } => Ok(length),
            ArrayEncoding::Dynamic => {
                let word = read_word(client, &self.address, self.descriptor.declaration_slot).await?;
                let length = word.to_u256();
                if length.bits() > 64 {
                    return Err(ProjectionError::LengthOverflow(length.to_string()));
                }
                Ok(length.low_u64())
            }
        }
    }

    /// Read every index of `range` with at most `concurrency` reads in flight.
    ///
    /// Results come back in index order. Each element succeeds or fails on
    /// its own: one failed read never hides the others.
    pub async fn read_range<R: LedgerReader + ?Sized>(
        &self,
        client: &R,
        range: Range<u64>,
        concurrency: usize,
    ) -> Vec<(u64, Result<StoredElement, ProjectionError>)> {
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Reading elements {:?} of {} from base slot {}",
                range, self.address, self.base
            );
        }

        stream::iter(range)
            .map(|index| async move { (index, self.read_element(client, index).await) })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// `read_length` followed by `read_range` over the whole array.
    ///
    /// Fails with `TooManyElements` before reading any element when the
    /// length exceeds `max_elements`: a declaration slot pointing at the
    /// wrong word can hold any value.
    pub async fn read_all<R: LedgerReader + ?Sized>(
        &self,
        client: &R,
        concurrency: usize,
        max_elements: u64,
    ) -> Result<Vec<(u64, Result<StoredElement, ProjectionError>)>, ProjectionError> {
        let length = self.read_length(client).await?;
        if length > max_elements {
            return Err(ProjectionError::TooManyElements {
                length,
                max: max_elements,
            });
        }
        Ok(self.read_range(client, 0..length, concurrency).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::Hash,
        rpc::{Receipt, RpcError},
        storage::{base_slot, LockRecord},
    };
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use tokio::sync::Mutex;

    /// In-memory contract storage
    #[derive(Default)]
    struct MockStorage {
        words: HashMap<Slot, Word>,
        failing: HashSet<Slot>,
        reads: Mutex<Vec<Slot>>,
    }

    #[async_trait]
    impl LedgerReader for MockStorage {
        async fn get_storage_at(&self, _address: &Address, slot: Slot) -> Result<Word, RpcError> {
            self.reads.lock().await.push(slot);
            if self.failing.contains(&slot) {
                return Err(RpcError::Transport("connection reset".into()));
            }
            Ok(self.words.get(&slot).copied().unwrap_or_default())
        }

        async fn call_raw(&self, _address: &Address, _data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
            Err(RpcError::Transport("not supported".into()))
        }

        async fn get_receipt(&self, transaction: &Hash) -> Result<Receipt, RpcError> {
            Ok(Receipt::unknown(*transaction))
        }
    }

    fn lock(n: u8) -> LockRecord {
        LockRecord {
            user: Address::new([n; 20]),
            start_time: 1_700_000_000 + n as u128,
            amount: U256::from(n as u64) * U256::exp10(18),
        }
    }

    fn projector() -> StorageProjector {
        StorageProjector::new(
            Address::new([0xb7; 20]),
            ArrayDescriptor::dynamic(Slot::from(0), LockRecord::layout().clone()),
        )
    }

    fn seed(storage: &mut MockStorage, projector: &StorageProjector, locks: &[LockRecord]) {
        storage.words.insert(
            projector.descriptor().declaration_slot,
            Word::from_u256(U256::from(locks.len())),
        );
        for (index, lock) in locks.iter().enumerate() {
            let first = projector.element_slot(index as u64);
            for (offset, word) in lock.encode_words().unwrap().into_iter().enumerate() {
                storage.words.insert(first.wrapping_add(U256::from(offset)), word);
            }
        }
    }

    #[tokio::test]
    async fn test_read_element_decodes_seeded_lock() {
        let projector = projector();
        let mut storage = MockStorage::default();
        seed(&mut storage, &projector, &[lock(1), lock(2)]);

        let element = projector.read_element(&storage, 1).await.unwrap();
        let record = element.into_record().unwrap();
        assert_eq!(LockRecord::try_from(&record).unwrap(), lock(2));
    }

    #[tokio::test]
    async fn test_read_element_reads_consecutive_slots() {
        let projector = projector();
        let storage = MockStorage::default();

        let element = projector.read_element(&storage, 3).await.unwrap();
        assert_eq!(element, StoredElement::Empty);

        let base = base_slot(Slot::from(0));
        let reads = storage.reads.lock().await.clone();
        assert_eq!(
            reads,
            vec![
                base.wrapping_add(U256::from(6)),
                base.wrapping_add(U256::from(7))
            ]
        );
    }

    #[tokio::test]
    async fn test_read_element_is_deterministic() {
        let projector = projector();
        let mut storage = MockStorage::default();
        seed(&mut storage, &projector, &[lock(7)]);

        let first = projector.read_element(&storage, 0).await.unwrap();
        let second = projector.read_element(&storage, 0).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_only_that_element() {
        let projector = projector();
        let mut storage = MockStorage::default();
        seed(&mut storage, &projector, &[lock(1), lock(2), lock(3)]);
        storage
            .failing
            .insert(projector.element_slot(1).wrapping_add(U256::one()));

        let results = projector.read_all(&storage, 2, 16).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, 0);
        assert!(results[0].1.is_ok());
        match &results[1].1 {
            Err(e) => assert!(e.is_retryable()),
            Ok(_) => panic!("element 1 should fail"),
        }
        assert_eq!(
            LockRecord::try_from(results[2].1.as_ref().unwrap().as_record().unwrap()).unwrap(),
            lock(3)
        );
    }

    #[tokio::test]
    async fn test_read_length_overflow() {
        let projector = projector();
        let mut storage = MockStorage::default();
        storage
            .words
            .insert(Slot::from(0), Word::from_u256(U256::one() << 64));

        assert!(matches!(
            projector.read_length(&storage).await,
            Err(ProjectionError::LengthOverflow(_))
        ));
    }

    #[tokio::test]
    async fn test_read_all_rejects_length_above_limit() {
        let projector = projector();
        let mut storage = MockStorage::default();
        // A balance-like word mistaken for the array length
        storage
            .words
            .insert(Slot::from(0), Word::from_u256(U256::exp10(18)));

        assert!(matches!(
            projector.read_all(&storage, 4, 1_000).await,
            Err(ProjectionError::TooManyElements { length, max: 1_000 }) if length == 1_000_000_000_000_000_000
        ));
        // Only the length word was read
        assert_eq!(storage.reads.lock().await.len(), 1);

        let mut storage = MockStorage::default();
        seed(&mut storage, &projector, &[lock(1), lock(2)]);
        assert_eq!(projector.read_all(&storage, 4, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fixed_array_length_needs_no_read() {
        let projector = StorageProjector::new(
            Address::zero(),
            ArrayDescriptor::fixed(Slot::from(2), LockRecord::layout().clone(), 5),
        );
        let storage = MockStorage::default();
        assert_eq!(projector.read_length(&storage).await.unwrap(), 5);
        assert!(storage.reads.lock().await.is_empty());
    }
}
