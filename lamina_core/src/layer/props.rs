// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer property types.

use super::id::LayerId;

/// Per-layer boolean flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Nothing in the layer's subtree is visible; it is never squashed.
    pub subtree_invisible: bool,
    /// The layer establishes a stacking context and orders its z-indexed
    /// children into negative and positive z lists.
    pub stacking_context: bool,
    /// The layer paints its own content (as opposed to painting into an
    /// ancestor as part of its flow).
    pub self_painting: bool,
    /// The layer has a filter effect.
    pub has_filter: bool,
    /// The layer is an overflow scroller; descendants scroll with it.
    pub scrolls_overflow: bool,
    /// The layer's scrolling is composited.
    pub needs_composited_scrolling: bool,
    /// Some descendant of the layer is composited.
    pub has_compositing_descendant: bool,
}

impl LayerFlags {
    /// Flags of a freshly created layer: self-painting, nothing else.
    pub const DEFAULT: Self = Self {
        subtree_invisible: false,
        stacking_context: false,
        self_painting: true,
        has_filter: false,
        scrolls_overflow: false,
        needs_composited_scrolling: false,
        has_compositing_descendant: false,
    };
}

impl Default for LayerFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What kind of renderer a layer paints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Ordinary box content.
    #[default]
    Box,
    /// A video element; its overlay is handled independently.
    Video,
    /// A frame, iframe, or plugin embedding.
    Part,
}

/// Blend mode used when compositing a layer onto what is below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    Normal,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
    /// Overlay blend.
    Overlay,
    /// Difference blend.
    Difference,
}

/// Inputs inherited from a layer's ancestors, produced by
/// [`update_inputs`](super::LayerStore::update_inputs).
///
/// Each field names the nearest *strict* ancestor with the relevant effect.
/// Squashed layers must agree with their squashing host on these because a
/// shared backing applies ancestor effects once for the whole group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AncestorInputs {
    /// Nearest ancestor with opacity below one.
    pub opacity_ancestor: Option<LayerId>,
    /// Nearest ancestor with a non-identity transform.
    pub transform_ancestor: Option<LayerId>,
    /// Nearest ancestor with a filter.
    pub filter_ancestor: Option<LayerId>,
    /// Nearest ancestor with a clip.
    pub clipping_container: Option<LayerId>,
    /// Nearest ancestor that scrolls its overflow.
    pub scrolling_ancestor: Option<LayerId>,
}

/// How a layer's content reaches the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositingState {
    /// Paints into whatever backing its ancestors paint into.
    NotComposited,
    /// Owns a dedicated backing.
    PaintsIntoOwnBacking,
    /// Paints into another layer's squashing layer.
    PaintsIntoGroupedBacking,
}
