//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::config::EngineConfig;
pub use crate::consts::gray::{MASK_BACKGROUND, MASK_FOREGROUND};
pub use crate::consts::{ElemType, GRID_SIZE};
pub use crate::contour::{Contour, ContourSet, Roi, RoiId};
pub use crate::data::{Grid, OwnedScanSlice, PixelSpacing, Point2d, RoiMask, ScanSlice};
pub use crate::error::{RoiError, RoiResult};
pub use crate::outcome::Outcome;

pub use crate::draw::{self, DrawInput, DrawLimits, IntensityWindow, Traced};
pub use crate::setops::{self, DerivedRoi, Margin, RindRadii, RoiOperation};
pub use crate::store::{CommitTicket, RtStruct, StructureSet, VolumeGeometry};
pub use crate::transect::{sample_transect, DistanceScaling, Transect, TransectThresholds};

pub use crate::job::{self, Pending};
