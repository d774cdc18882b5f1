//! Property-based checks for profile expressions.

use condconf_core::profiles::evaluate;
use proptest::prelude::*;

/// Small alphabet so generated sets overlap the tested names often.
fn profile_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("dev".to_string()),
        Just("test".to_string()),
        Just("prod".to_string()),
        "[a-z][a-z0-9_-]{0,8}".prop_map(String::from),
    ]
}

fn active_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(profile_strategy(), 0..4)
}

proptest! {
    #[test]
    fn negation_inverts_membership(profile in profile_strategy(), active in active_strategy()) {
        let expected = !active.contains(&profile);
        prop_assert_eq!(evaluate(&format!("!{profile}"), &active), Ok(expected));
    }

    #[test]
    fn or_lists_match_any_member(
        a in profile_strategy(),
        b in profile_strategy(),
        active in active_strategy(),
    ) {
        let expected = active.contains(&a) || active.contains(&b);
        prop_assert_eq!(evaluate(&format!("{a}, {b}"), &active), Ok(expected));
        prop_assert_eq!(evaluate(&format!("{a} | {b}"), &active), Ok(expected));
    }

    #[test]
    fn and_lists_match_all_members(
        a in profile_strategy(),
        b in profile_strategy(),
        active in active_strategy(),
    ) {
        let expected = active.contains(&a) && active.contains(&b);
        prop_assert_eq!(evaluate(&format!("({a} & {b})"), &active), Ok(expected));
        prop_assert_eq!(evaluate(&format!("!({a} & {b})"), &active), Ok(!expected));
    }
}
