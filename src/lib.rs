//! Reconstruct components and nets from a KiCad schematic.
//!
//! KiCad schematics are s-expressions that place symbols, wires, junctions
//! and labels but never say which pins are connected. This crate parses the
//! text into a generic tree ([`sexpr`]), picks out the schematic entities
//! ([`Schematic`]) and infers nets from their coordinates ([`infer_nets`]).
//!
//! ```
//! use kicad_context::{infer_nets, Schematic};
//!
//! let schematic = Schematic::try_from(
//!     r#"(kicad_sch
//!         (symbol (lib_id "Device:R") (at 120 100 0)
//!             (property "Reference" "R1") (pin "1") (pin "2"))
//!         (global_label "VCC" (at 100 100 0)))"#,
//! )?;
//! let nets = infer_nets(&schematic);
//! assert_eq!(nets[0].name, "VCC");
//! assert_eq!(nets[0].connections["R1"], ["1", "2"]);
//! # Ok::<(), kicad_context::ParseError>(())
//! ```

#[cfg(test)]
macro_rules! test_data {
    ($fname:expr) => {
        std::fs::read_to_string(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/test/",
            $fname
        ))
        .unwrap()
    };
}

mod context;
mod error;
mod nets;
mod schematic;
pub mod sexpr;

pub use context::{Context, Hierarchy, Metadata, Module, Summary, POWER_REF_PREFIX};
pub use error::ParseError;
pub use nets::{infer_nets, Net, ENDPOINT_RADIUS, JUNCTION_SNAP, LABEL_RADIUS, LABEL_SNAP};
pub use schematic::{
    classify, Component, GlobalLabel, Junction, Pin, Point, Schematic, Skip, Wire,
};
pub use sexpr::{Atom, SExpr};

/// Parse schematic text straight into a [`Context`]
pub fn build_context(input: &str, metadata: Metadata) -> Result<Context, ParseError> {
    let schematic = Schematic::try_from(input)?;
    Ok(Context::build(schematic, metadata))
}
