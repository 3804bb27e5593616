use serde::Serialize;

use crate::{error::ParseError, sexpr::SExpr};

mod extract;

pub use extract::Skip;

/// A point in schematic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Everything recognized at the top level of a schematic
#[derive(Debug, Clone, Default)]
pub struct Schematic {
    pub components: Vec<Component>,
    pub wires: Vec<Wire>,
    pub junctions: Vec<Junction>,
    pub global_labels: Vec<GlobalLabel>,
}

/// A placed symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    /// Reference designator, `UNKNOWN` when the symbol has none
    pub id: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub value: String,
    pub footprint: String,
    pub position: Point,
    /// `None` when the symbol lists no pins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pins: Option<Vec<Pin>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pin {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// A wire segment chain. Only the first and last point connect to anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wire {
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Wire {
    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Junction {
    pub at: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalLabel {
    pub name: String,
    pub at: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Component {
    /// All pin numbers, empty when the component has no pins
    pub fn pin_numbers(&self) -> impl Iterator<Item = &str> {
        self.pins.iter().flatten().map(|pin| pin.number.as_str())
    }
}

/// Classify a component from its library id and value.
///
/// `power` symbols end up typed by their value so that e.g. a `power:GND`
/// symbol reads as `GND`.
pub fn classify(lib_id: &str, value: &str) -> String {
    fn first_non_empty<'s>(candidates: &[&'s str], fallback: &'s str) -> &'s str {
        candidates
            .iter()
            .copied()
            .find(|s| !s.is_empty())
            .unwrap_or(fallback)
    }

    let mut typ = first_non_empty(&[value], "Unknown");
    if let Some((lib, rest)) = lib_id.split_once(':') {
        let symbol = rest.split(':').next().unwrap_or_default();
        typ = match lib {
            "power" => "Power",
            "Device" => match symbol {
                "R" => "Resistor",
                "C" => "Capacitor",
                "L" => "Inductor",
                "D" => "Diode",
                _ => first_non_empty(&[symbol, value], "Component"),
            },
            "Transistor_FET" => "MOSFET",
            "Connector_Generic" => "Connector",
            _ => first_non_empty(&[symbol, value], "Component"),
        };
    }

    if lib_id.starts_with("power:") {
        typ = first_non_empty(&[value], "Power");
    }

    typ.to_owned()
}

impl<'a> From<&SExpr<'a>> for Schematic {
    fn from(root: &SExpr<'a>) -> Self {
        extract::schematic(root)
    }
}

impl<'a> TryFrom<&'a str> for Schematic {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        let root = SExpr::try_from(input)?;
        Ok(Schematic::from(&root))
    }
}

impl<'a> TryFrom<&'a String> for Schematic {
    type Error = ParseError;

    fn try_from(input: &'a String) -> Result<Self, Self::Error> {
        Schematic::try_from(input.as_str())
    }
}
