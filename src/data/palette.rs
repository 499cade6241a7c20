use crate::data::series::EntityId;
use crate::foundation::core::Rgba8;

/// Tableau10 categorical scheme.
pub const TABLEAU10: [Rgba8; 10] = [
    Rgba8::opaque(0x4e, 0x79, 0xa7),
    Rgba8::opaque(0xf2, 0x8e, 0x2c),
    Rgba8::opaque(0xe1, 0x57, 0x59),
    Rgba8::opaque(0x76, 0xb7, 0xb2),
    Rgba8::opaque(0x59, 0xa1, 0x4f),
    Rgba8::opaque(0xed, 0xc9, 0x49),
    Rgba8::opaque(0xaf, 0x7a, 0xa1),
    Rgba8::opaque(0xff, 0x9d, 0xa7),
    Rgba8::opaque(0x9c, 0x75, 0x5f),
    Rgba8::opaque(0xba, 0xb0, 0xab),
];

/// Ordinal color for an entity, cycling through [`TABLEAU10`].
pub fn color_for(id: EntityId) -> Rgba8 {
    TABLEAU10[id.index() % TABLEAU10.len()]
}
