//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};

use crate::fixtures::{AddressStyle, Wallet};

/// Generate a deterministic wallet.
pub fn wallet() -> impl Strategy<Value = Wallet> {
    any::<[u8; 32]>().prop_map(Wallet::from_seed)
}

/// Generate a wallet of any supported address style.
pub fn any_style_wallet() -> impl Strategy<Value = Wallet> {
    (wallet(), address_style()).prop_map(|(w, style)| w.with_style(style))
}

/// Generate an address style.
pub fn address_style() -> impl Strategy<Value = AddressStyle> {
    prop_oneof![
        Just(AddressStyle::Legacy),
        Just(AddressStyle::LegacyUncompressed),
        Just(AddressStyle::NestedSegwit),
        Just(AddressStyle::NativeSegwit),
    ]
}

/// Generate a declination like `68° 52' 56.9"`.
pub fn declination() -> impl Strategy<Value = String> {
    (-89i32..=89, 0u32..60, 0u32..600)
        .prop_map(|(d, m, s)| format!("{}° {}' {}.{}\"", d, m, s / 10, s % 10))
}

/// Generate a right ascension like `16h 29m 1.0s`.
pub fn right_ascension() -> impl Strategy<Value = String> {
    (0u32..24, 0u32..60, 0u32..600)
        .prop_map(|(h, m, s)| format!("{}h {}m {}.{}s", h, m, s / 10, s % 10))
}

/// Generate free-form story text, including non-ASCII.
pub fn story() -> impl Strategy<Value = String> {
    "\\PC{0,64}".prop_map(String::from)
}

/// Generate star data the way clients submit it.
pub fn star() -> impl Strategy<Value = JsonValue> {
    (
        declination(),
        right_ascension(),
        story(),
        proptest::option::of("[a-z]{1,8}"),
        proptest::option::of(-30i64..30),
    )
        .prop_map(|(dec, ra, story, cen, mag)| {
            let mut star = json!({ "dec": dec, "ra": ra, "story": story });
            if let Some(cen) = cen {
                star["cen"] = json!(cen);
            }
            if let Some(mag) = mag {
                star["mag"] = json!(mag);
            }
            star
        })
}

/// Generate a list of stars to submit in order.
pub fn stars(max_len: usize) -> impl Strategy<Value = Vec<JsonValue>> {
    prop::collection::vec(star(), 0..=max_len)
}
