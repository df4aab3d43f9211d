//! TXT record textual codec.
//!
//! Converts `key=value` tokens into a [`TxtRecordSet`] and back. Decoding
//! is all-or-nothing: one malformed token fails the whole call and no
//! partially built set is observable by the caller.

use mdnsctl_engine::{TxtEntry, TxtRecordSet};

use crate::error::CodecError;

/// Decodes an ordered token sequence into a TXT record set.
///
/// Each token must contain a `=`; the key is everything before the first
/// `=` and must be non-empty, the value is everything after and may be
/// empty. Entry order follows token order.
pub fn decode<S: AsRef<str>>(tokens: &[S]) -> Result<TxtRecordSet, CodecError> {
    let mut entries = TxtRecordSet::with_capacity(tokens.len());
    for token in tokens {
        let token = token.as_ref();
        let Some((key, value)) = token.split_once('=') else {
            return Err(CodecError::MissingSeparator(token.to_string()));
        };
        if key.is_empty() {
            return Err(CodecError::EmptyKey(token.to_string()));
        }
        entries.push(TxtEntry::new(key, value));
    }
    Ok(entries)
}

/// Encodes a TXT record set back into `key=value` tokens, the inverse of
/// [`decode`] for any set with non-empty, `=`-free keys.
pub fn encode(set: &TxtRecordSet) -> Vec<String> {
    set.iter()
        .map(|entry| format!("{}={}", entry.key, entry.value))
        .collect()
}
