//! Binary layout of the USM container.
//!
//! # Module Organization
//!
//! - [`block`]: Decodes the fixed-width fields of a single block
//! - [`markers`]: Marker sequences delimiting payload inside a stream
//!
//! # Architecture
//!
//! ```text
//! Container:                        Reassembled stream:
//! ┌──────────────────┐              ┌─────────────────┐
//! │ ...leading bytes │              │ stream header   │
//! ├──────────────────┤              │ #HEADER END     │ ← markers
//! │ CRID block       │ ← block      │ metadata        │
//! │ @SFV / @SFA /    │   ::decode() │ #METADATA END   │
//! │ @ALP / @SBT /    │              │ payload         │ → output
//! │ @CUE blocks ...  │              │ #CONTENTS END   │
//! └──────────────────┘              └─────────────────┘
//! ```

pub mod block;
pub mod markers;
