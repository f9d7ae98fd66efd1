//! Fabrication metadata attached to plotted shapes
//!
//! Mirrors the Gerber X2 object attributes: which component and net a shape belongs to and
//! what kind of copper or non-copper feature its aperture draws.

use serde::{Deserialize, Serialize};

/// How much netlist information a shape carries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetInfo {
    #[default]
    Unspecified,
    /// Component reference only
    Component,
    /// Net name only
    Net,
    /// Net name and component reference
    NetAndComponent,
    /// Net, component and pad name
    All,
}

/// Aperture function of a flashed or drawn shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApertureAttribute {
    /// Copper track or zone fill
    Conductor,
    /// Copper that carries no current (unconnected zone, board text, board outline)
    NonConductor,
    /// Plated through-hole pad on an external layer
    ComponentPad,
    /// Pad of a surface-mount footprint, copper defined
    SmdPadCuDef,
    /// Round SMD pad, usually a BGA ball
    BgaPadCuDef,
    /// Edge connector pad
    ConnectorPad,
    /// Non-plated hole pad
    WasherPad,
    /// Via or through-hole pad on an inner layer
    ViaPad,
    /// Copper etched as part of a footprint outline
    EtchedComponent,
}

/// Metadata record passed with a plotter call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad_name: Option<String>,
    #[serde(default)]
    pub net_info: NetInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<ApertureAttribute>,
    /// Pad without electrical connection (mechanical or unnamed)
    #[serde(default)]
    pub not_in_net: bool,
}

impl PlotMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Component-only metadata for footprint graphics and texts
    pub fn component(reference: impl Into<String>) -> Self {
        Self {
            component_ref: Some(reference.into()),
            net_info: NetInfo::Component,
            ..Self::default()
        }
    }

    pub fn with_aperture(mut self, aperture: ApertureAttribute) -> Self {
        self.aperture = Some(aperture);
        self
    }

    pub fn set_component_ref(&mut self, reference: impl Into<String>) {
        self.component_ref = Some(reference.into());
    }

    pub fn set_net_name(&mut self, net: impl Into<String>) {
        self.net_name = Some(net.into());
    }

    pub fn set_pad_name(&mut self, pad: impl Into<String>) {
        self.pad_name = Some(pad.into());
    }

    pub fn set_net_info(&mut self, info: NetInfo) {
        self.net_info = info;
    }

    pub fn set_aperture(&mut self, aperture: ApertureAttribute) {
        self.aperture = Some(aperture);
    }
}
