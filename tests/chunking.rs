//! Property tests for payload chunking.

use bytes::Bytes;
use proptest::prelude::*;

use catprinter_ble::session::{chunk_count, chunk_payload, chunk_size_for_mtu};

proptest! {
    #[test]
    fn chunks_cover_payload_in_order(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        mtu in 4u16..=517,
    ) {
        let payload = Bytes::from(data.clone());
        let chunk_size = chunk_size_for_mtu(mtu).unwrap();
        let chunks: Vec<Bytes> = chunk_payload(&payload, chunk_size).collect();

        let expected_count = (data.len() + chunk_size - 1) / chunk_size;
        prop_assert_eq!(chunks.len(), expected_count);
        prop_assert_eq!(chunk_count(data.len(), chunk_size), expected_count);
        prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= chunk_size));
        // Only the last chunk may be short.
        if let Some((_, head)) = chunks.split_last() {
            prop_assert!(head.iter().all(|c| c.len() == chunk_size));
        }
        prop_assert_eq!(chunks.concat(), data);
    }

    #[test]
    fn chunk_size_is_mtu_minus_overhead(mtu in any::<u16>()) {
        match chunk_size_for_mtu(mtu) {
            Ok(size) => prop_assert_eq!(size, usize::from(mtu) - 3),
            Err(_) => prop_assert!(mtu <= 3),
        }
    }
}
