//! 集合运算与描绘后处理的消融实验.
//!
//! 在合成体模上依次计时每种运算. 体模切片数由 `$ABLATION_SLICES` 控制.

mod profile;
mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();
    println!("Available cpus: {}", utils::cpus());
    runner::run().analyze();
}
