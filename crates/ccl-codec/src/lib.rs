//! Product identifier codec for the Chain-of-Custody Ledger.
//!
//! Provides the lossless two-way mapping between a batch's identity fields
//! (GTIN, lot, expiry, optional serial) and the two textual label forms:
//!
//! - human-readable: `(01)<14 digits>[(21)<serial>](10)<lot>(17)<YYMMDD>`
//! - machine (as carried by the optical symbol):
//!   `01<14 digits>[21<serial><GS>]10<lot><GS>17<YYMMDD>` (GS = U+001D)
//!
//! Decoding accepts either form, tolerates a missing group separator before
//! the `17` tag, and strips known symbology identifier prefixes first.
//!
//! Round-trip property: `encode(decode(x)) == x` for any `x` produced by
//! [`encode`].

pub mod error;
pub mod gtin;
pub mod label;

pub use error::CodecError;
pub use gtin::{check_digit, normalize_gtin};
pub use label::{decode, encode, EncodedIdentifier, IdentifierFields};
