//! FFPP macros: values collected from `; FFPP-<name>: <value>` lines and
//! substituted into `<FFPP-<name>>` placeholders.

mod substitute;
mod table;

pub use substitute::{
    find_placeholder, Placeholder, Substitutor, CALCULATED_PREFIX, LAYER_Z_HEIGHT,
    NEXT_LAYER_HEIGHT, TOTAL_LAYER_COUNT,
};
pub use table::{parse_marker, MacroValueTable, MACRO_KEYWORD};
