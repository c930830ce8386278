//! Example: paint labels into an RLE volume and inspect the result
//!
//! Run with: cargo run --example paint_volume

use anyhow::Context;
use rle_volume::{
    create_store, Axis, Brush, BrushShape, CoverageMode, PaintSettings, Paintbrush, Region,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("RLE Volume Example: Label Painting");
    println!("==================================\n");

    let mut store = create_store(128, 128, 24, 0u8).context("creating store")?;
    println!("{}\n", store.index().summary());

    // A flat round brush on slice 12
    let brush = Brush::default()
        .with_radius(10.0)
        .with_shape(BrushShape::Round)
        .flat(Axis::Z);
    let liver = Paintbrush::new(brush, PaintSettings::new(1))?;
    for x in (30..90).step_by(6) {
        liver.paint(&mut store, [x, 64, 12])?;
    }

    // Only paint over label 1
    let lesion = Paintbrush::new(
        brush.with_radius(4.0).volumetric(),
        PaintSettings::new(2)
            .with_overwrite_label(1)
            .with_coverage(CoverageMode::PaintOverOne),
    )?;
    lesion.paint(&mut store, [60, 64, 12])?;

    let stats = store.stats();
    println!("After painting:");
    println!("  {}", stats.summary());
    println!();

    // Walk one row through the brushed area
    let row = Region::new([20, 64, 12], [80, 1, 1])?;
    let line: String = store
        .begin_read(&row)?
        .into_pixels()
        .map(|(_, v)| match v {
            0 => '.',
            1 => '#',
            _ => '@',
        })
        .collect();
    println!("Row y=64, z=12, x=20..100:");
    println!("  {}", line);
    println!("  runs in line: {}", store.line(64, 12)?.run_count());

    store.validate()?;
    println!("\n{}", stats.to_json()?);
    println!("\n✓ Example complete!");
    Ok(())
}
