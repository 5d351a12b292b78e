//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use roi_berry::prelude::*;
use std::thread;
use utils::phantom;

/// 每种运算重复的次数.
const ROUNDS: usize = 3;

/// 描绘实验使用的画笔选区个数.
const BRUSHES: usize = 24;

fn time_setop(op: RoiOperation) -> Profile {
    let mut profile = Profile::new();
    for _ in 0..ROUNDS {
        profile.op_start();
        let derived = setops::apply(&op, "ABLATION", &[] as &[&str]).unwrap();
        profile.op_elapsed();
        for outcome in derived.slices().values() {
            profile.count_slice(outcome.as_ref().produced().map(ContourSet::len));
        }
    }
    profile.finish()
}

fn time_trace(grid: Grid) -> Profile {
    let mut profile = Profile::new();
    let scan = OwnedScanSlice::zeros(grid, PixelSpacing::unit());
    let limits = EngineConfig::default().draw_limits();
    for seed in 0..BRUSHES {
        let input = DrawInput::Pixels(phantom::brush_selection(grid, seed));
        profile.op_start();
        let traced = draw::trace(&scan.as_immutable(), &input, limits).unwrap();
        profile.op_elapsed();
        profile.count_slice(traced.produced().map(|t| t.contours.len()));
    }
    profile.finish()
}

/// 实际运行.
pub fn run() -> AblationResult {
    let grid = Grid::standard();
    let num_slices = utils::slices_from_env_or_default();
    let (a, b) = phantom::overlapping_pair(grid, num_slices);
    let radii = RindRadii::new(3, 10).unwrap();

    let ops = [
        ("expand", RoiOperation::with_margin(a.clone(), Margin(8))),
        ("contract", RoiOperation::with_margin(a.clone(), Margin(-8))),
        (
            "inner rind",
            RoiOperation::InnerRind {
                roi: a.clone(),
                radii,
            },
        ),
        (
            "outer rind",
            RoiOperation::OuterRind {
                roi: a.clone(),
                radii,
            },
        ),
        ("union", RoiOperation::Union(a.clone(), b.clone())),
        ("intersection", RoiOperation::Intersection(a.clone(), b.clone())),
        ("difference", RoiOperation::Difference(a, b)),
    ];

    println!("Running ablation studies on {num_slices} slices...");
    thread::scope(|s| {
        let handles: Vec<_> = ops
            .into_iter()
            .map(|(name, op)| (name, s.spawn(move || time_setop(op))))
            .collect();
        let tracer = s.spawn(move || time_trace(grid));

        handles
            .into_iter()
            .chain([("trace", tracer)])
            .map(|(name, th)| (name, th.join().expect("Thread joining error")))
            .collect()
    })
}
