//! Board layers and layer sets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlotError;

/// Number of layers in the layer table
pub const LAYER_COUNT: u8 = 50;

/// Number of copper layers
pub const COPPER_LAYER_COUNT: u8 = 32;

/// A board layer: copper layers first (front, inner, back), then technical and user layers.
/// The default is `F.Cu`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Layer(u8);

impl Layer {
    pub const F_CU: Layer = Layer(0);
    pub const B_CU: Layer = Layer(31);
    pub const B_ADHES: Layer = Layer(32);
    pub const F_ADHES: Layer = Layer(33);
    pub const B_PASTE: Layer = Layer(34);
    pub const F_PASTE: Layer = Layer(35);
    pub const B_SILKS: Layer = Layer(36);
    pub const F_SILKS: Layer = Layer(37);
    pub const B_MASK: Layer = Layer(38);
    pub const F_MASK: Layer = Layer(39);
    pub const DWGS_USER: Layer = Layer(40);
    pub const CMTS_USER: Layer = Layer(41);
    pub const ECO1_USER: Layer = Layer(42);
    pub const ECO2_USER: Layer = Layer(43);
    pub const EDGE_CUTS: Layer = Layer(44);
    pub const MARGIN: Layer = Layer(45);
    pub const B_CRTYD: Layer = Layer(46);
    pub const F_CRTYD: Layer = Layer(47);
    pub const B_FAB: Layer = Layer(48);
    pub const F_FAB: Layer = Layer(49);

    const NON_COPPER_NAMES: [&str; 18] = [
        "B.Adhes",
        "F.Adhes",
        "B.Paste",
        "F.Paste",
        "B.SilkS",
        "F.SilkS",
        "B.Mask",
        "F.Mask",
        "Dwgs.User",
        "Cmts.User",
        "Eco1.User",
        "Eco2.User",
        "Edge.Cuts",
        "Margin",
        "B.CrtYd",
        "F.CrtYd",
        "B.Fab",
        "F.Fab",
    ];

    /// Layer with the given table index
    pub fn from_index(index: u8) -> Option<Layer> {
        (index < LAYER_COUNT).then_some(Layer(index))
    }

    /// Inner copper layer `In{n}.Cu`, `n` in `1..=30`
    pub fn inner(n: u8) -> Option<Layer> {
        (1..COPPER_LAYER_COUNT - 1).contains(&n).then_some(Layer(n))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn is_copper(self) -> bool {
        self.0 < COPPER_LAYER_COUNT
    }

    pub fn is_external_copper(self) -> bool {
        self == Self::F_CU || self == Self::B_CU
    }

    /// Every layer in table order
    pub fn all() -> impl Iterator<Item = Layer> {
        (0..LAYER_COUNT).map(Layer)
    }

    pub fn name(self) -> String {
        match self.0 {
            0 => "F.Cu".to_string(),
            31 => "B.Cu".to_string(),
            n if n < COPPER_LAYER_COUNT => format!("In{n}.Cu"),
            n => Self::NON_COPPER_NAMES[usize::from(n - COPPER_LAYER_COUNT)].to_string(),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Layer {
    type Err = PlotError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "F.Cu" => return Ok(Self::F_CU),
            "B.Cu" => return Ok(Self::B_CU),
            _ => {}
        }

        if let Some(n) = name
            .strip_prefix("In")
            .and_then(|rest| rest.strip_suffix(".Cu"))
            .and_then(|digits| digits.parse::<u8>().ok())
        {
            return Self::inner(n).ok_or_else(|| PlotError::UnknownLayer(name.to_string()));
        }

        Self::NON_COPPER_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|i| Layer(COPPER_LAYER_COUNT + i as u8))
            .ok_or_else(|| PlotError::UnknownLayer(name.to_string()))
    }
}

impl TryFrom<String> for Layer {
    type Error = PlotError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Layer> for String {
    fn from(layer: Layer) -> String {
        layer.name()
    }
}

/// Set of layers as a bit mask
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Layer>", into = "Vec<Layer>")]
pub struct LayerSet(u64);

impl LayerSet {
    pub const EMPTY: LayerSet = LayerSet(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    pub fn single(layer: Layer) -> Self {
        Self(1 << layer.0)
    }

    /// Every copper layer
    pub fn all_cu() -> Self {
        Self((1u64 << COPPER_LAYER_COUNT) - 1)
    }

    /// Front and back copper
    pub fn external_cu() -> Self {
        [Layer::F_CU, Layer::B_CU].into_iter().collect()
    }

    /// Silkscreen, mask, adhesive, paste, courtyard and fabrication layers on both sides
    pub fn all_board_tech() -> Self {
        [
            Layer::B_SILKS,
            Layer::B_MASK,
            Layer::B_ADHES,
            Layer::B_PASTE,
            Layer::B_CRTYD,
            Layer::B_FAB,
            Layer::F_SILKS,
            Layer::F_MASK,
            Layer::F_ADHES,
            Layer::F_PASTE,
            Layer::F_CRTYD,
            Layer::F_FAB,
        ]
        .into_iter()
        .collect()
    }

    pub fn with(mut self, layer: Layer) -> Self {
        self.insert(layer);
        self
    }

    pub fn insert(&mut self, layer: Layer) {
        self.0 |= 1 << layer.0;
    }

    pub fn remove(&mut self, layer: Layer) {
        self.0 &= !(1 << layer.0);
    }

    pub fn contains(&self, layer: Layer) -> bool {
        self.0 & (1 << layer.0) != 0
    }

    pub fn intersection(&self, other: LayerSet) -> LayerSet {
        LayerSet(self.0 & other.0)
    }

    /// At least one layer is shared with `other`
    pub fn intersects(&self, other: LayerSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Layer> + '_ {
        Layer::all().filter(|layer| self.contains(*layer))
    }
}

impl FromIterator<Layer> for LayerSet {
    fn from_iter<I: IntoIterator<Item = Layer>>(iter: I) -> Self {
        let mut set = LayerSet::new();
        for layer in iter {
            set.insert(layer);
        }
        set
    }
}

impl From<Vec<Layer>> for LayerSet {
    fn from(layers: Vec<Layer>) -> Self {
        layers.into_iter().collect()
    }
}

impl From<LayerSet> for Vec<Layer> {
    fn from(set: LayerSet) -> Self {
        set.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_names_round_trip_through_parse() {
        for layer in Layer::all() {
            assert_eq!(layer.name().parse::<Layer>().unwrap(), layer);
        }
        assert_eq!(Layer::inner(3).unwrap().name(), "In3.Cu");
        assert_eq!(Layer::EDGE_CUTS.name(), "Edge.Cuts");
    }

    #[test]
    fn test_unknown_layer_names() {
        assert!("In31.Cu".parse::<Layer>().is_err());
        assert!("In0.Cu".parse::<Layer>().is_err());
        assert!("Top".parse::<Layer>().is_err());
    }

    #[test]
    fn test_masks() {
        assert_eq!(LayerSet::all_cu().len(), 32);
        assert!(LayerSet::all_cu().contains(Layer::inner(30).unwrap()));
        assert!(!LayerSet::all_cu().contains(Layer::B_ADHES));
        assert_eq!(LayerSet::external_cu().len(), 2);
        assert!(!LayerSet::all_board_tech().contains(Layer::EDGE_CUTS));
        assert!(LayerSet::all_board_tech().contains(Layer::F_MASK));
    }

    #[test]
    fn test_layer_set_serializes_as_names() {
        let set = LayerSet::single(Layer::F_CU).with(Layer::F_MASK);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["F.Cu","F.Mask"]"#);
        let back: LayerSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
