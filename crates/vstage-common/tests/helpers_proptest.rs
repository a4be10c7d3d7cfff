//! Property tests for the identifier and storage-key helpers

use proptest::prelude::*;
use uuid::Uuid;
use vstage_common::{ids::parse_uuid, keys::extract_key, VstageError};

proptest! {
    #[test]
    fn uuid_form_does_not_matter(bytes in any::<[u8; 16]>()) {
        let id = Uuid::from_bytes(bytes);
        let hyphenated = parse_uuid(&id.hyphenated().to_string()).unwrap();
        let simple = parse_uuid(&id.simple().to_string()).unwrap();
        prop_assert_eq!(hyphenated, id);
        prop_assert_eq!(simple, id);
    }

    #[test]
    fn uuid_length_is_checked_before_content(s in "[g-z]{0,31}") {
        prop_assert_eq!(parse_uuid(&s), Err(VstageError::InvalidUuidLength));
    }

    #[test]
    fn path_style_key_is_everything_after_bucket(
        bucket in "[a-z][a-z0-9-]{2,20}",
        key in "[a-z0-9]{1,10}(/[a-z0-9_-]{1,10}){0,4}(\\.png)?",
    ) {
        let url = format!("http://localhost:9000/{}/{}", bucket, key);
        prop_assert_eq!(extract_key(&url).unwrap(), key);
    }

    #[test]
    fn virtual_hosted_key_is_whole_path(key in "[a-z0-9]{1,10}(/[a-z0-9_-]{1,10}){0,4}(\\.png)?") {
        let url = format!("https://assets.s3.eu-west-1.amazonaws.com/{}", key);
        prop_assert_eq!(extract_key(&url).unwrap(), key);
    }

    #[test]
    fn extract_key_never_panics(s in "\\PC*") {
        let _ = extract_key(&s);
    }
}
