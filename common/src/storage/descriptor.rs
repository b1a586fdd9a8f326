use serde::{Deserialize, Serialize};

use super::{base_slot, element_slot, Slot, StructLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArrayEncoding {
    // Length at the declaration slot, data at keccak256(declaration slot)
    Dynamic,
    // Data starts at the declaration slot itself, length is static
    Fixed { length: u64 },
}

impl Default for ArrayEncoding {
    fn default() -> Self {
        ArrayEncoding::Dynamic
    }
}

/// Where an array of structs lives and how each element is packed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDescriptor {
    pub declaration_slot: Slot,
    pub layout: StructLayout,
    #[serde(default)]
    pub encoding: ArrayEncoding,
}

impl ArrayDescriptor {
    pub fn dynamic(declaration_slot: Slot, layout: StructLayout) -> Self {
        Self {
            declaration_slot,
            layout,
            encoding: ArrayEncoding::Dynamic,
        }
    }

    pub fn fixed(declaration_slot: Slot, layout: StructLayout, length: u64) -> Self {
        Self {
            declaration_slot,
            layout,
            encoding: ArrayEncoding::Fixed { length },
        }
    }

    pub fn words_per_element(&self) -> u64 {
        self.layout.words_per_element() as u64
    }

    pub fn base_slot(&self) -> Slot {
        match self.encoding {
            ArrayEncoding::Dynamic => base_slot(self.declaration_slot),
            ArrayEncoding::Fixed { .. } => self.declaration_slot,
        }
    }

    pub fn element_slot(&self, index: u64) -> Slot {
        element_slot(self.base_slot(), index, self.words_per_element())
    }
}
