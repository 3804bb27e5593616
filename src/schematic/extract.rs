use log::debug;
use thiserror::Error;

use crate::sexpr::{Atom, SExpr};

use super::{classify, Component, GlobalLabel, Junction, Pin, Point, Schematic, Wire};

/// Why an entity was left out of the schematic. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    #[error("symbol has no lib_id")]
    MissingLibId,
    #[error("wire has {0} point(s), need at least 2")]
    TooFewPoints(usize),
    #[error("no position")]
    MissingPosition,
    #[error("no name")]
    MissingName,
}

/// Atom text, treating an empty string as absent
fn non_empty(atom: Option<&Atom>) -> Option<String> {
    atom.map(|atom| atom.text().into_owned())
        .filter(|s| !s.is_empty())
}

fn uuid(sexpr: &SExpr) -> Option<String> {
    sexpr.value("uuid").map(|atom| atom.text().into_owned())
}

/// Pin uuids are sometimes split into several atoms; those are joined with `-`.
fn pin_uuid(pin: &SExpr) -> Option<String> {
    let uuid = pin.children("uuid").last()?;
    let parts: Vec<_> = uuid
        .as_list()?
        .iter()
        .skip(1)
        .filter_map(SExpr::as_atom)
        .map(|atom| atom.text())
        .collect();
    match parts.as_slice() {
        [] => None,
        [single] => Some(single.clone().into_owned()),
        parts => Some(parts.join("-")),
    }
}

fn pins(symbol: &SExpr) -> Vec<Pin> {
    symbol
        .children("pin")
        .filter_map(|pin| {
            let number = non_empty(pin.atom(1))?;
            Some(Pin {
                number,
                uuid: pin_uuid(pin),
            })
        })
        .collect()
}

impl<'a> TryFrom<&SExpr<'a>> for Component {
    type Error = Skip;

    fn try_from(symbol: &SExpr<'a>) -> Result<Self, Self::Error> {
        let lib_id = non_empty(symbol.value("lib_id")).ok_or(Skip::MissingLibId)?;

        let property = |name: &str| {
            symbol
                .property(name)
                .map(|atom| atom.text().into_owned())
                .unwrap_or_default()
        };
        let reference = property("Reference");
        let value = property("Value");
        let footprint = property("Footprint");

        let position = symbol.position().map(Point::from).unwrap_or_default();
        let pins = pins(symbol);
        let typ = classify(&lib_id, &value);
        let value = if value.is_empty() { lib_id } else { value };

        Ok(Component {
            id: if reference.is_empty() {
                "UNKNOWN".to_owned()
            } else {
                reference
            },
            typ,
            value,
            footprint,
            position,
            pins: (!pins.is_empty()).then_some(pins),
        })
    }
}

fn xy(point: &SExpr) -> Option<Point> {
    let x = point.atom(1)?.as_f64()?;
    let y = point.atom(2)?.as_f64()?;
    Some(Point { x, y })
}

impl<'a> TryFrom<&SExpr<'a>> for Wire {
    type Error = Skip;

    fn try_from(wire: &SExpr<'a>) -> Result<Self, Self::Error> {
        let points: Vec<Point> = wire
            .children("pts")
            .flat_map(|pts| pts.children("xy"))
            .filter_map(xy)
            .collect();
        if points.len() < 2 {
            return Err(Skip::TooFewPoints(points.len()));
        }
        Ok(Wire {
            points,
            uuid: uuid(wire),
        })
    }
}

impl<'a> TryFrom<&SExpr<'a>> for Junction {
    type Error = Skip;

    fn try_from(junction: &SExpr<'a>) -> Result<Self, Self::Error> {
        let at = junction.position().ok_or(Skip::MissingPosition)?.into();
        Ok(Junction {
            at,
            uuid: uuid(junction),
        })
    }
}

impl<'a> TryFrom<&SExpr<'a>> for GlobalLabel {
    type Error = Skip;

    fn try_from(label: &SExpr<'a>) -> Result<Self, Self::Error> {
        let name = non_empty(label.atom(1)).ok_or(Skip::MissingName)?;
        let at = label.position().ok_or(Skip::MissingPosition)?.into();
        Ok(GlobalLabel {
            name,
            at,
            uuid: uuid(label),
        })
    }
}

/// Collect every `label` entity directly below `root`, logging the ones that
/// do not convert.
fn collect<'a, T>(root: &SExpr<'a>, label: &str) -> Vec<T>
where
    T: for<'b> TryFrom<&'b SExpr<'a>, Error = Skip>,
{
    root.children(label)
        .filter_map(|sexpr| match T::try_from(sexpr) {
            Ok(item) => Some(item),
            Err(skip) => {
                debug!("Skipping {label}: {skip}");
                None
            }
        })
        .collect()
}

pub(super) fn schematic(root: &SExpr) -> Schematic {
    let schematic = Schematic {
        components: collect(root, "symbol"),
        wires: collect(root, "wire"),
        junctions: collect(root, "junction"),
        global_labels: collect(root, "global_label"),
    };
    debug!(
        "Extracted {} components, {} wires, {} junctions, {} global labels",
        schematic.components.len(),
        schematic.wires.len(),
        schematic.junctions.len(),
        schematic.global_labels.len()
    );
    schematic
}
