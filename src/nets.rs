//! Net inference from schematic geometry.
//!
//! The schematic format never states which pins are connected, so nets are
//! reconstructed from proximity. Each check below uses its own metric and
//! threshold; they are not interchangeable.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, trace};
use serde::Serialize;

use crate::schematic::{Point, Schematic, Wire};

/// Euclidean radius around a global label within which components join its net
pub const LABEL_RADIUS: f64 = 50.0;
/// Euclidean radius around a wire endpoint within which components join the wire's net
pub const ENDPOINT_RADIUS: f64 = 10.0;
/// Half-width of the open box in which a global label names a wire
pub const LABEL_SNAP: f64 = 5.0;
/// Half-width of the closed box used for junction and wire point matching
pub const JUNCTION_SNAP: f64 = 1.0;

/// A set of component pins forming one electrical node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Net {
    pub name: String,
    /// Component id to sorted, deduplicated pin numbers
    pub connections: BTreeMap<String, Vec<String>>,
}

fn label_names_point(label: &Point, point: &Point) -> bool {
    (label.x - point.x).abs() < LABEL_SNAP && (label.y - point.y).abs() < LABEL_SNAP
}

fn snaps_to(a: &Point, b: &Point) -> bool {
    (a.x - b.x).abs() <= JUNCTION_SNAP && (a.y - b.y).abs() <= JUNCTION_SNAP
}

/// Round half toward positive infinity
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

type Connections = BTreeMap<String, BTreeSet<String>>;

/// Working set for one inference run: net name to component id to pin set,
/// kept in discovery order.
struct NetBuilder<'s> {
    schematic: &'s Schematic,
    nets: Vec<(String, Connections)>,
    index: HashMap<String, usize>,
}

impl<'s> NetBuilder<'s> {
    fn new(schematic: &'s Schematic) -> Self {
        Self {
            schematic,
            nets: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn net(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.nets.len();
        self.nets.push((name.to_owned(), Connections::new()));
        self.index.insert(name.to_owned(), idx);
        idx
    }

    fn attach_near(&mut self, net: usize, point: &Point, radius: f64) {
        let schematic = self.schematic;
        let near = schematic
            .components
            .iter()
            .filter(|comp| comp.position.distance(point) <= radius);
        let (name, connections) = &mut self.nets[net];
        for comp in near {
            trace!(
                "Net {name}: attaching {} near ({}, {})",
                comp.id,
                point.x,
                point.y
            );
            connections
                .entry(comp.id.clone())
                .or_default()
                .extend(comp.pin_numbers().map(str::to_owned));
        }
    }

    fn junction_at(&self, point: &Point) -> bool {
        self.schematic
            .junctions
            .iter()
            .any(|junction| snaps_to(&junction.at, point))
    }

    fn wire_name(&self, start: &Point, end: &Point) -> String {
        self.schematic
            .global_labels
            .iter()
            .find(|label| label_names_point(&label.at, start) || label_names_point(&label.at, end))
            .map(|label| label.name.clone())
            .unwrap_or_else(|| {
                format!(
                    "NET_{}_{}",
                    round_half_up(start.x),
                    round_half_up(start.y)
                )
            })
    }

    fn seed_labels(&mut self) {
        let schematic = self.schematic;
        for label in &schematic.global_labels {
            let net = self.net(&label.name);
            self.attach_near(net, &label.at, LABEL_RADIUS);
        }
    }

    fn seed_wires(&mut self) {
        let schematic = self.schematic;
        for (i, wire) in schematic.wires.iter().enumerate() {
            let (Some(start), Some(end)) = (wire.start(), wire.end()) else {
                continue;
            };
            if wire.points.len() < 2 {
                continue;
            }

            let name = self.wire_name(&start, &end);
            let net = self.net(&name);
            self.attach_near(net, &start, ENDPOINT_RADIUS);
            self.attach_near(net, &end, ENDPOINT_RADIUS);

            // Only a junction on the start point pulls in other wires
            if self.junction_at(&start) {
                let others = schematic
                    .wires
                    .iter()
                    .enumerate()
                    .filter(|(j, other)| *j != i && touches(other, &start))
                    .filter_map(|(_, other)| other.start());
                for other_start in others {
                    self.attach_near(net, &other_start, ENDPOINT_RADIUS);
                }
            }
        }
    }

    fn finish(self) -> Vec<Net> {
        self.nets
            .into_iter()
            .filter_map(|(name, connections)| {
                let connections: BTreeMap<String, Vec<String>> = connections
                    .into_iter()
                    .filter(|(_, pins)| !pins.is_empty())
                    .map(|(id, pins)| (id, pins.into_iter().collect()))
                    .collect();
                if connections.is_empty() {
                    trace!("Dropping net {name}: no connected pins");
                    None
                } else {
                    Some(Net { name, connections })
                }
            })
            .collect()
    }
}

fn touches(wire: &Wire, point: &Point) -> bool {
    wire.points.iter().any(|p| snaps_to(p, point))
}

/// Infer named nets from the positions of labels, wires, junctions and
/// components.
///
/// Global labels seed nets first, then every wire either joins a label's net
/// or gets a `NET_<x>_<y>` name from its rounded start point. Nets without a
/// single connected pin are dropped.
pub fn infer_nets(schematic: &Schematic) -> Vec<Net> {
    let mut builder = NetBuilder::new(schematic);
    builder.seed_labels();
    builder.seed_wires();
    let nets = builder.finish();
    debug!("Inferred {} nets", nets.len());
    nets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::{Component, GlobalLabel, Junction, Pin};
    use rstest::*;

    fn comp(id: &str, x: f64, y: f64, pins: &[&str]) -> Component {
        Component {
            id: id.to_owned(),
            typ: "Component".to_owned(),
            value: String::new(),
            footprint: String::new(),
            position: Point::new(x, y),
            pins: (!pins.is_empty()).then(|| {
                pins.iter()
                    .map(|number| Pin {
                        number: (*number).to_owned(),
                        uuid: None,
                    })
                    .collect()
            }),
        }
    }

    fn wire(points: &[(f64, f64)]) -> Wire {
        Wire {
            points: points.iter().copied().map(Point::from).collect(),
            uuid: None,
        }
    }

    fn label(name: &str, x: f64, y: f64) -> GlobalLabel {
        GlobalLabel {
            name: name.to_owned(),
            at: Point::new(x, y),
            uuid: None,
        }
    }

    fn junction(x: f64, y: f64) -> Junction {
        Junction {
            at: Point::new(x, y),
            uuid: None,
        }
    }

    fn connections(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(id, pins)| {
                (
                    (*id).to_owned(),
                    pins.iter().map(|p| (*p).to_owned()).collect(),
                )
            })
            .collect()
    }

    fn net<'n>(nets: &'n [Net], name: &str) -> Option<&'n Net> {
        nets.iter().find(|net| net.name == name)
    }

    #[test]
    fn empty_schematic_has_no_nets() {
        assert!(infer_nets(&Schematic::default()).is_empty());
    }

    #[test]
    fn label_attaches_nearby_components() {
        let schematic = Schematic {
            components: vec![
                comp("R1", 120.0, 100.0, &["1", "2"]),
                comp("R2", 151.0, 100.0, &["1", "2"]),
            ],
            global_labels: vec![label("VCC", 100.0, 100.0)],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);
        assert_eq!(
            nets,
            vec![Net {
                name: "VCC".to_owned(),
                connections: connections(&[("R1", &["1", "2"])]),
            }]
        );
    }

    #[rstest]
    #[case(50.0, true)]
    #[case(50.01, false)]
    fn label_radius_is_inclusive(#[case] dx: f64, #[case] attached: bool) {
        let schematic = Schematic {
            components: vec![comp("U1", dx, 0.0, &["1"])],
            global_labels: vec![label("SIG", 0.0, 0.0)],
            ..Default::default()
        };
        assert_eq!(!infer_nets(&schematic).is_empty(), attached);
    }

    #[test]
    fn wire_without_label_gets_synthesized_name() {
        let schematic = Schematic {
            components: vec![
                comp("R1", 12.4, 20.5, &["2"]),
                comp("R2", 60.0, 20.0, &["1"]),
                comp("R3", 35.0, 20.0, &["1"]),
            ],
            wires: vec![wire(&[(10.4, 20.5), (35.0, 40.0), (60.0, 20.0)])],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);
        assert_eq!(
            nets,
            vec![Net {
                name: "NET_10_21".to_owned(),
                connections: connections(&[("R1", &["2"]), ("R2", &["1"])]),
            }]
        );
    }

    #[rstest]
    #[case(2.5, "3")]
    #[case(-2.5, "-2")]
    #[case(-0.4, "0")]
    #[case(7.49, "7")]
    fn synthesized_names_round_half_up(#[case] x: f64, #[case] rounded: &str) {
        let schematic = Schematic {
            components: vec![comp("R1", x, 0.0, &["1"])],
            wires: vec![wire(&[(x, 0.0), (x, 100.0)])],
            ..Default::default()
        };
        assert_eq!(infer_nets(&schematic)[0].name, format!("NET_{rounded}_0"));
    }

    #[rstest]
    #[case(4.9, 4.9, "VCC")]
    #[case(5.0, 0.0, "NET_0_0")]
    #[case(4.0, 6.0, "NET_0_0")]
    fn label_names_wire_within_open_box(#[case] dx: f64, #[case] dy: f64, #[case] expected: &str) {
        let schematic = Schematic {
            components: vec![comp("R1", 0.0, 100.0, &["1"])],
            wires: vec![wire(&[(0.0, 0.0), (0.0, 100.0)])],
            global_labels: vec![label("VCC", dx, 100.0 + dy)],
            ..Default::default()
        };
        assert!(net(&infer_nets(&schematic), expected).is_some());
    }

    #[test]
    fn first_matching_label_names_the_wire() {
        let schematic = Schematic {
            components: vec![comp("R1", 0.0, 0.0, &["1"])],
            wires: vec![wire(&[(0.0, 0.0), (100.0, 0.0)])],
            global_labels: vec![label("A", 100.0, 1.0), label("B", 0.0, 1.0)],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);
        assert_eq!(
            net(&nets, "A").map(|n| &n.connections),
            Some(&connections(&[("R1", &["1"])]))
        );
        // B only reaches R1 through its own label radius
        assert_eq!(
            net(&nets, "B").map(|n| &n.connections),
            Some(&connections(&[("R1", &["1"])]))
        );
    }

    #[test]
    fn junction_pulls_in_other_wire_start() {
        let schematic = Schematic {
            components: vec![
                comp("R1", 0.0, 0.0, &["1"]),
                comp("R2", 100.0, 0.0, &["2"]),
                comp("R3", 50.0, 100.0, &["1"]),
            ],
            wires: vec![
                wire(&[(0.0, 0.0), (50.0, 50.0)]),
                wire(&[(100.0, 0.0), (50.5, 49.5)]),
                wire(&[(50.0, 50.0), (50.0, 100.0)]),
            ],
            junctions: vec![junction(50.0, 50.0)],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);

        // Wires 1 and 2 only end on the junction, so they pull nothing in.
        assert_eq!(
            net(&nets, "NET_0_0").map(|n| &n.connections),
            Some(&connections(&[("R1", &["1"])]))
        );
        assert_eq!(
            net(&nets, "NET_100_0").map(|n| &n.connections),
            Some(&connections(&[("R2", &["2"])]))
        );
        // Wire 3 starts on the junction: it gains the other wires' starts
        // and reaches R3 at its own end.
        assert_eq!(
            net(&nets, "NET_50_50").map(|n| &n.connections),
            Some(&connections(&[("R1", &["1"]), ("R2", &["2"]), ("R3", &["1"])]))
        );
    }

    #[test]
    fn wires_ending_on_a_junction_stay_separate() {
        let schematic = Schematic {
            components: vec![comp("R1", 0.0, 0.0, &["1"]), comp("R2", 200.0, 200.0, &["1"])],
            wires: vec![
                wire(&[(0.0, 0.0), (50.0, 50.0)]),
                wire(&[(200.0, 200.0), (50.0, 50.0)]),
            ],
            junctions: vec![junction(50.0, 50.0)],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);
        assert_eq!(
            net(&nets, "NET_0_0").map(|n| &n.connections),
            Some(&connections(&[("R1", &["1"])]))
        );
        assert_eq!(
            net(&nets, "NET_200_200").map(|n| &n.connections),
            Some(&connections(&[("R2", &["1"])]))
        );
    }

    #[rstest]
    #[case(1.0, true)]
    #[case(1.01, false)]
    fn junction_box_is_inclusive(#[case] dx: f64, #[case] attached: bool) {
        let schematic = Schematic {
            components: vec![comp("R1", 0.0, 0.0, &["1"]), comp("R2", 100.0, 50.0, &["1"])],
            wires: vec![
                wire(&[(0.0, 0.0), (50.0, 50.0)]),
                wire(&[(50.0, 50.0), (100.0, 50.0)]),
            ],
            junctions: vec![junction(50.0 + dx, 50.0)],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);
        let joined = net(&nets, "NET_50_50").map(|n| n.connections.contains_key("R1"));
        assert_eq!(joined, Some(attached));
    }

    #[test]
    fn component_near_other_wire_end_is_not_propagated() {
        let schematic = Schematic {
            components: vec![comp("R9", 100.0, 100.0, &["1"])],
            wires: vec![
                wire(&[(0.0, 0.0), (50.0, 50.0)]),
                wire(&[(50.0, 50.0), (100.0, 100.0)]),
            ],
            junctions: vec![junction(50.5, 50.5)],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);
        assert!(net(&nets, "NET_0_0").is_none());
        assert!(net(&nets, "NET_50_50").is_some());
    }

    #[test]
    fn no_junction_no_propagation() {
        let schematic = Schematic {
            components: vec![comp("R1", 0.0, 0.0, &["1"]), comp("R2", 100.0, 0.0, &["1"])],
            wires: vec![
                wire(&[(0.0, 0.0), (50.0, 50.0)]),
                wire(&[(50.0, 50.0), (100.0, 0.0)]),
            ],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);
        assert_eq!(
            net(&nets, "NET_0_0").map(|n| &n.connections),
            Some(&connections(&[("R1", &["1"])]))
        );
        assert_eq!(
            net(&nets, "NET_50_50").map(|n| &n.connections),
            Some(&connections(&[("R2", &["1"])]))
        );
    }

    #[test]
    fn pins_are_sorted_as_strings_and_deduplicated() {
        let schematic = Schematic {
            components: vec![
                comp("U1", 0.0, 0.0, &["10", "2", "1", "2"]),
                comp("U1", 5.0, 0.0, &["3"]),
            ],
            global_labels: vec![label("BUS", 0.0, 0.0)],
            ..Default::default()
        };
        assert_eq!(
            infer_nets(&schematic)[0].connections,
            connections(&[("U1", &["1", "10", "2", "3"])])
        );
    }

    #[test]
    fn pinless_components_and_empty_nets_are_dropped() {
        let schematic = Schematic {
            components: vec![comp("TP1", 0.0, 0.0, &[]), comp("R1", 200.0, 0.0, &["1"])],
            global_labels: vec![label("EMPTY", 0.0, 0.0), label("R", 200.0, 0.0)],
            ..Default::default()
        };
        let nets = infer_nets(&schematic);
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].connections, connections(&[("R1", &["1"])]));
    }

    #[test]
    fn single_point_wire_is_ignored() {
        let schematic = Schematic {
            components: vec![comp("R1", 0.0, 0.0, &["1"])],
            wires: vec![wire(&[(0.0, 0.0)])],
            ..Default::default()
        };
        assert!(infer_nets(&schematic).is_empty());
    }

    #[test]
    fn nets_follow_discovery_order_and_are_stable() {
        let schematic = Schematic {
            components: vec![comp("R1", 0.0, 0.0, &["1"]), comp("R2", 300.0, 0.0, &["1"])],
            wires: vec![wire(&[(300.0, 0.0), (300.0, 50.0)])],
            global_labels: vec![label("Z", 0.0, 0.0)],
            ..Default::default()
        };
        let first = infer_nets(&schematic);
        let names: Vec<_> = first.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "NET_300_0"]);
        assert_eq!(first, infer_nets(&schematic));
    }
}
