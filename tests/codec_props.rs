//! Property tests: encode and decode are inverses for the envelope and
//! the variable-length payload shapes.

use bytes::{Bytes, BytesMut};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};
use zeroize::Zeroizing;

use secmod_client::message::codec::MessageCodec;
use secmod_client::message::key::CacheRequest;
use secmod_client::message::nvm::AddObjectRequest;
use secmod_client::message::{Group, Message, LABEL_LEN};

fn group_strategy() -> impl Strategy<Value = Group> {
    prop_oneof![
        Just(Group::Comm),
        Just(Group::Nvm),
        Just(Group::Key),
        Just(Group::Custom),
    ]
}

proptest! {
    #[test]
    fn envelope_roundtrips(
        seq in any::<u16>(),
        group in group_strategy(),
        action in any::<u16>(),
        payload in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let msg = Message::new(seq, group, action, Bytes::from(payload)).unwrap();

        let mut codec = MessageCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(msg.clone(), &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        prop_assert_eq!(decoded, msg);
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn add_object_payload_roundtrips(
        id in any::<u16>(),
        access in any::<u16>(),
        flags in any::<u16>(),
        label in proptest::collection::vec(any::<u8>(), 0..=LABEL_LEN),
        data in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let req = AddObjectRequest {
            id,
            access,
            flags,
            label: Bytes::from(label),
            data: Bytes::from(data),
        };

        let mut buf = BytesMut::new();
        req.encode(&mut buf).unwrap();
        prop_assert_eq!(AddObjectRequest::decode(&buf).unwrap(), req);
    }

    #[test]
    fn cache_payload_roundtrips(
        flags in any::<u32>(),
        key_id in any::<u16>(),
        label in proptest::collection::vec(any::<u8>(), 0..=LABEL_LEN),
        key in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let req = CacheRequest {
            flags,
            key_id,
            label: Bytes::from(label),
            key: Zeroizing::new(key),
        };

        let mut buf = BytesMut::new();
        req.encode(&mut buf).unwrap();

        let decoded = CacheRequest::decode(&buf).unwrap();
        prop_assert_eq!(decoded.flags, req.flags);
        prop_assert_eq!(decoded.key_id, req.key_id);
        prop_assert_eq!(decoded.label, req.label);
        prop_assert_eq!(&decoded.key[..], &req.key[..]);
    }
}
