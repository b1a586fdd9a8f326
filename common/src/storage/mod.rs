// Storage projection
//
// Reads the raw 32-byte words a contract keeps for a dynamic array of structs
// and decodes them into records, without relying on any getter the contract
// may or may not expose.
//
// Placement rule for a dynamic array declared at slot `p`:
//   length               -> slot p
//   element i, word k    -> keccak256(encode32(p)) + i * words_per_element + k
//
// Fixed-size arrays skip the hashing and start at `p` itself.

mod descriptor;
mod error;
mod layout;
mod lock;
mod projector;
mod record;
mod slot;
mod word;

pub use descriptor::*;
pub use error::*;
pub use layout::*;
pub use lock::*;
pub use projector::*;
pub use record::*;
pub use slot::*;
pub use word::*;
