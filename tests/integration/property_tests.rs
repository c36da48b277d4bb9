//! Round-trip properties

use memstream_pool::{MemoryStreamUtil, ReaderSource};
use proptest::prelude::*;

use crate::{read_all, small_block_util};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_bytes_round_trip(data in proptest::collection::vec(any::<u8>(), 0..600)) {
        let util = small_block_util();
        let mut stream = util.get_span_sync(&data).unwrap();
        prop_assert_eq!(stream.position(), 0);
        prop_assert_eq!(read_all(&mut stream), data);
    }

    #[test]
    fn prop_text_round_trip(text in ".*") {
        let util = small_block_util();

        let mut stream = util.get_str_sync(Some(text.as_str())).unwrap();
        prop_assert_eq!(read_all(&mut stream), text.as_bytes());

        let units: Vec<u16> = text.encode_utf16().collect();
        let mut stream = util.get_utf16_sync(&units).unwrap();
        prop_assert_eq!(read_all(&mut stream), text.as_bytes());
    }

    #[test]
    fn prop_materialize_acquire_round_trip(data in proptest::collection::vec(any::<u8>(), 0..600)) {
        let util = small_block_util();
        let rt = runtime();

        let mut stream = util.get_span_sync(&data).unwrap();
        let out = rt.block_on(util.bytes_from_stream(Some(&mut stream), false, None)).unwrap();
        prop_assert_eq!(out, data);
    }

    #[test]
    fn prop_materialize_from_position(
        data in proptest::collection::vec(any::<u8>(), 1..300),
        offset in any::<prop::sample::Index>(),
    ) {
        let util = MemoryStreamUtil::default();
        let rt = runtime();
        let position = offset.index(data.len() + 1);

        let mut stream = util.get_span_sync(&data).unwrap();
        stream.set_position(position as u64);
        let out = rt.block_on(util.bytes_from_stream(Some(&mut stream), false, None)).unwrap();
        prop_assert_eq!(out, &data[position..]);
    }

    #[test]
    fn prop_reader_round_trip(data in proptest::collection::vec(any::<u8>(), 0..600)) {
        let util = small_block_util();
        let rt = runtime();

        let mut source = ReaderSource::new(&data[..]);
        let out = rt.block_on(util.bytes_from_stream(Some(&mut source), false, None)).unwrap();
        prop_assert_eq!(out, data);
    }
}
