//! 结构集适配层: 在引擎的 [`Roi`] 与持久化的 [`RtStruct`] 之间转换,
//! 并以修订号保证同名 ROI 的提交不会互相覆盖.

#[cfg(feature = "serde")]
mod archive;
mod rtstruct;

pub use rtstruct::{
    ContourItem, InitGeometryError, RoiContour, RtStruct, StructureSetRoi, VolumeGeometry,
    CLOSED_PLANAR,
};

use crate::contour::{ContourSet, Roi, RoiId};
use crate::error::{RoiError, RoiResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 引擎生成的 ROI 使用的生成算法标记.
const GENERATION_ALGORITHM: &str = "SEMIAUTOMATIC";

/// 一次提交的凭据: 目标名称及开始时它的修订号.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitTicket {
    name: String,
    revision: u64,
}

impl CommitTicket {
    /// 目标名称.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 开始提交时的修订号. 新名称为 0.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Default)]
struct Inner {
    rt: RtStruct,
    revisions: HashMap<String, u64>,
}

impl Inner {
    fn revision(&self, name: &str) -> u64 {
        self.revisions.get(name).copied().unwrap_or(0)
    }
}

/// 可在线程间共享的结构集. 读者得到的总是拥有所有权的快照.
#[derive(Debug)]
pub struct StructureSet {
    geometry: VolumeGeometry,
    inner: RwLock<Inner>,
}

impl StructureSet {
    /// 空结构集.
    pub fn new(geometry: VolumeGeometry) -> Self {
        Self::from_rt_struct(geometry, RtStruct::default())
    }

    /// 包装已有的结构集. 所有 ROI 的修订号从 0 开始.
    pub fn from_rt_struct(geometry: VolumeGeometry, rt: RtStruct) -> Self {
        Self {
            geometry,
            inner: RwLock::new(Inner {
                rt,
                revisions: HashMap::new(),
            }),
        }
    }

    /// 体数据几何.
    #[inline]
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// 当前原生表示的一份拷贝.
    pub fn to_rt_struct(&self) -> RtStruct {
        self.read().rt.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 按 ROI 编号排序的所有名称.
    pub fn list_roi_names(&self) -> Vec<String> {
        let inner = self.read();
        let mut rois: Vec<_> = inner.rt.structure_set_rois.iter().collect();
        rois.sort_by_key(|r| r.number);
        rois.into_iter().map(|r| r.name.clone()).collect()
    }

    /// 名称是否存在 (区分大小写).
    pub fn contains_name(&self, name: &str) -> bool {
        self.read().rt.roi_by_name(name).is_some()
    }

    /// 名称以 `prefix` 或其大写形式开头的 ROI, 按编号排序.
    pub fn suggest_names(&self, prefix: &str) -> Vec<String> {
        let upper = prefix.to_uppercase();
        self.list_roi_names()
            .into_iter()
            .filter(|n| n.starts_with(prefix) || n.starts_with(&upper))
            .collect()
    }

    /// 某 ROI 在某切片上的轮廓. 该切片没有轮廓时返回空集合.
    pub fn get_contours(&self, name: &str, slice: usize) -> RoiResult<ContourSet> {
        self.geometry.check_slice(slice)?;
        let inner = self.read();
        let roi = inner
            .rt
            .roi_by_name(name)
            .ok_or_else(|| RoiError::UnknownRoi(name.to_string()))?;
        let mut slices = self.geometry.decode(inner.rt.contours_of(roi.number))?;
        Ok(slices.remove(&slice).unwrap_or_default())
    }

    /// 某 ROI 的完整快照, 带有当前修订号.
    pub fn snapshot(&self, name: &str) -> RoiResult<Roi> {
        let inner = self.read();
        let roi = inner
            .rt
            .roi_by_name(name)
            .ok_or_else(|| RoiError::UnknownRoi(name.to_string()))?;
        let slices = self.geometry.decode(inner.rt.contours_of(roi.number))?;
        Ok(Roi::stored(
            RoiId(roi.number),
            roi.name.clone(),
            self.geometry.grid(),
            slices,
            inner.revision(name),
        ))
    }

    /// 开始一次提交, 记下目标名称当前的修订号.
    pub fn begin_commit(&self, name: &str) -> CommitTicket {
        CommitTicket {
            name: name.to_string(),
            revision: self.read().revision(name),
        }
    }

    /// 以 `contours` 整体替换 (或新建) `ticket` 指定的 ROI.
    ///
    /// 自 `begin_commit` 以来该名称已被其它提交修改时返回 `RoiError::StaleWrite`,
    /// 任何失败都不改变结构集. 新名称获得 `最大编号 + 1`, 已有名称保留编号.
    pub fn commit(
        &self,
        ticket: CommitTicket,
        contours: &BTreeMap<usize, ContourSet>,
    ) -> RoiResult<RoiId> {
        let items = self.geometry.encode(contours)?;

        let mut inner = self.write();
        let found = inner.revision(&ticket.name);
        if found != ticket.revision {
            log::warn!(
                "stale write to `{}`: expected revision {}, found {}",
                ticket.name,
                ticket.revision,
                found
            );
            return Err(RoiError::StaleWrite {
                name: ticket.name,
                expected: ticket.revision,
                found,
            });
        }

        let existing = inner.rt.roi_by_name(&ticket.name).map(|r| r.number);
        let number = match existing {
            Some(number) => number,
            None => {
                let number = inner.rt.next_roi_number()?;
                inner.rt.structure_set_rois.push(StructureSetRoi {
                    number,
                    name: ticket.name.clone(),
                    generation_algorithm: GENERATION_ALGORITHM.to_string(),
                });
                number
            }
        };
        log::info!(
            "commit `{}` as ROI {}: {} contours on {} slices",
            ticket.name,
            number,
            items.len(),
            contours.len()
        );
        inner.rt.replace_contours(number, items);
        *inner.revisions.entry(ticket.name).or_insert(0) += 1;
        Ok(RoiId(number))
    }
}
