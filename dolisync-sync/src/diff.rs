//! Field-level diff between a proposed contact and the stored one.

use dolisync_core::{
    normalize, normalize_text, CanonicalContact, FieldDiff, NativeField, RemoteContact,
};

/// Compute the minimal update that turns `current` into `proposed`.
///
/// Values are compared after normalization, so whitespace and absent-vs-empty
/// differences never produce an entry. Entries carry the proposed raw value.
/// A field or attribute the remote record lacks compares as `""`.
pub fn diff(proposed: &CanonicalContact, current: &RemoteContact) -> FieldDiff {
    let mut out = FieldDiff::default();

    for field in NativeField::ALL {
        let new_value = proposed.native(field);
        if normalize_text(new_value) != normalize(current.native(field)) {
            out.insert_native(field, new_value);
        }
    }

    for (key, new_value) in &proposed.extra {
        if normalize_text(new_value) != normalize(current.extra(*key)) {
            out.insert_extra(*key, new_value.as_str());
        }
    }

    out
}
