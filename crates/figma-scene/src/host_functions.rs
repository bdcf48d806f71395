//! Host function pass-through catalog
//!
//! The top-level `figma.*` functions a UI bridge may forward through
//! [`Bridge::call_host`](crate::Bridge::call_host). The list is closed at
//! compile time; the sandbox's handshake only narrows it at runtime to the
//! names it actually advertised.

use std::fmt;
use std::str::FromStr;

use figma_scene_common::protocol::error::BridgeError;

macro_rules! host_functions {
    ($($(#[$doc:meta])* $variant:ident => $name:literal),+ $(,)?) => {
        /// A forwardable top-level host function.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HostFunction {
            $($(#[$doc])* $variant),+
        }

        impl HostFunction {
            /// Every forwardable function, in declaration order.
            pub const ALL: &'static [HostFunction] = &[$(HostFunction::$variant),+];

            /// Name of the member on the `figma` global.
            pub fn name(&self) -> &'static str {
                match self {
                    $(HostFunction::$variant => $name),+
                }
            }
        }

        impl FromStr for HostFunction {
            type Err = BridgeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(HostFunction::$variant),)+
                    other => Err(BridgeError::UnknownHostFunction(other.to_string())),
                }
            }
        }
    };
}

host_functions! {
    /// `figma.closePlugin(message?)`
    ClosePlugin => "closePlugin",
    /// `figma.commitUndo()`
    CommitUndo => "commitUndo",
    /// `figma.triggerUndo()`
    TriggerUndo => "triggerUndo",
    /// `figma.getNodeByIdAsync(id)`
    GetNodeByIdAsync => "getNodeByIdAsync",
    /// `figma.getStyleByIdAsync(id)`
    GetStyleByIdAsync => "getStyleByIdAsync",
    /// `figma.loadFontAsync(fontName)`
    LoadFontAsync => "loadFontAsync",
    /// `figma.loadAllPagesAsync()`
    LoadAllPagesAsync => "loadAllPagesAsync",
    /// `figma.listAvailableFontsAsync()`
    ListAvailableFontsAsync => "listAvailableFontsAsync",
    /// `figma.getLocalPaintStylesAsync()`
    GetLocalPaintStylesAsync => "getLocalPaintStylesAsync",
    /// `figma.getLocalTextStylesAsync()`
    GetLocalTextStylesAsync => "getLocalTextStylesAsync",
    CreateRectangle => "createRectangle",
    CreateEllipse => "createEllipse",
    CreateFrame => "createFrame",
    CreateText => "createText",
    CreateComponent => "createComponent",
    CreatePage => "createPage",
    /// `figma.group(nodes, parent, index?)`
    Group => "group",
    /// `figma.flatten(nodes, parent?, index?)`
    Flatten => "flatten",
    /// `figma.saveVersionHistoryAsync(title, description?)`
    SaveVersionHistoryAsync => "saveVersionHistoryAsync",
    /// `figma.openExternal(url)`
    OpenExternal => "openExternal",
}

impl HostFunction {
    /// Names of every catalog entry, for a sandbox host to advertise.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.name().to_string()).collect()
    }
}

impl fmt::Display for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
