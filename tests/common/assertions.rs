//! Resolution assertions

use dissemination::{Condition, Resolution};

/// Assert the resolution found the object at `key`
pub fn assert_found(resolution: &Resolution, key: &str) {
    match resolution {
        Resolution::Found(obj) => assert_eq!(obj.key(), key, "resolved to the wrong object"),
        Resolution::Condition(c) => panic!("expected {key}, got condition {c}"),
    }
}

/// Assert the resolution ended in `condition`
pub fn assert_condition(resolution: &Resolution, condition: Condition) {
    match resolution {
        Resolution::Found(obj) => panic!("expected {condition}, got object {obj}"),
        Resolution::Condition(c) => assert_eq!(*c, condition),
    }
}
