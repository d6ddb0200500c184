// SPDX-License-Identifier: GPL-3.0-only

//! Device options and their wire codec
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  encode   ┌──────────────┐
//! │  OptionSet   │ ────────▶ │  WireRecord  │
//! │ key → value  │ ◀──────── │  JSON object │
//! └──────────────┘  decode   └──────────────┘
//!        │
//!        ├── keys:    closed key list, wire names, shapes
//!        ├── enums:   per-enum literal tables
//!        └── records: GPS, proxy, time-shift, preview/file formats
//! ```
//!
//! An option set is sparse: only requested or reported keys are present,
//! and a key can be present with an explicit null.

pub mod codec;
pub mod enums;
pub mod keys;
pub mod records;
pub mod set;
pub mod value;

pub use codec::{WireRecord, decode, encode};
pub use enums::*;
pub use keys::{Access, OptionKey, ScalarKind, ValueShape};
pub use records::*;
pub use set::OptionSet;
pub use value::{EnumKind, EnumValue, Field, OptionValue, RecordKind, RecordValue};
