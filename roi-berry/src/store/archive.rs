use super::{RtStruct, StructureSet, VolumeGeometry};
use crate::error::{RoiError, RoiResult};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

fn archive_error(e: impl std::fmt::Display) -> RoiError {
    RoiError::Archive(e.to_string())
}

impl StructureSet {
    /// 把体数据几何与当前结构集压缩为不透明字节流 (bincode + zlib).
    pub fn to_compact_bytes(&self) -> RoiResult<Vec<u8>> {
        let inner = self.read();
        let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
        bincode::serialize_into(&mut e, &(&self.geometry, &inner.rt)).map_err(archive_error)?;
        e.finish().map_err(archive_error)
    }

    /// 从 [`StructureSet::to_compact_bytes`] 的输出恢复. 所有修订号从 0 开始.
    pub fn from_compact_bytes(bytes: &[u8]) -> RoiResult<Self> {
        let (geometry, rt): (VolumeGeometry, RtStruct) =
            bincode::deserialize_from(ZlibDecoder::new(bytes)).map_err(archive_error)?;
        Ok(Self::from_rt_struct(geometry, rt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::ContourSet;
    use crate::data::mask::RoiMask;
    use crate::data::point::{Grid, PixelSpacing};
    use std::collections::BTreeMap;

    #[test]
    fn test_archive_round_trip() {
        let spacing = PixelSpacing::new(1.171_875, 1.171_875).unwrap();
        let geometry =
            VolumeGeometry::uniform(Grid::standard(), spacing, [-300.0, -300.0, 12.5], 5.0, 4)
                .unwrap();
        let s = StructureSet::new(geometry);
        let mask = RoiMask::from_fn(Grid::standard(), |(h, w)| {
            let (dh, dw) = (h as i64 - 256, w as i64 - 200);
            dh * dh + dw * dw <= 40 * 40
        });
        let contours: BTreeMap<usize, ContourSet> = [(1, ContourSet::from_mask(&mask))].into();
        s.commit(s.begin_commit("Body"), &contours).unwrap();

        let bytes = s.to_compact_bytes().unwrap();
        let restored = StructureSet::from_compact_bytes(&bytes).unwrap();
        assert_eq!(restored.geometry(), s.geometry());
        assert_eq!(restored.to_rt_struct(), s.to_rt_struct());
        assert_eq!(restored.get_contours("Body", 1).unwrap(), contours[&1]);
        assert_eq!(restored.begin_commit("Body").revision(), 0);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(
            StructureSet::from_compact_bytes(&[1, 2, 3, 4]),
            Err(RoiError::Archive(_))
        ));
    }
}
