use std::collections::BTreeMap;

use belt_blast_core::{BlockColor, CellRecord, LevelData, ShooterColumn, ShooterRecord};

/// Largest magazine dealt to a single showcase shooter.
pub const SHOWCASE_MAX_AMMO: u32 = 20;

const SHOWCASE_COLUMNS: usize = 4;

/// Builds the demonstration level: a blue border, red diagonals, green
/// top and bottom triangles and yellow left and right triangles.
///
/// The table carries exactly enough ammo of each color to clear the grid,
/// split into magazines of at most [`SHOWCASE_MAX_AMMO`] and dealt
/// round-robin over four columns.
#[must_use]
pub fn showcase(size: u32) -> LevelData {
    let mut cells = Vec::new();
    let mut totals: BTreeMap<BlockColor, u32> = BTreeMap::new();
    let last = size.saturating_sub(1);
    let center = last as f32 / 2.0;

    for x in 0..size {
        for y in 0..size {
            let color = if x == 0 || y == 0 || x == last || y == last {
                BlockColor::Blue
            } else if x == y || x == last - y {
                BlockColor::Red
            } else if (y as f32 - center).abs() > (x as f32 - center).abs() {
                BlockColor::Green
            } else {
                BlockColor::Yellow
            };
            *totals.entry(color).or_default() += 1;
            cells.push(CellRecord {
                x: i32::try_from(x).unwrap_or(i32::MAX),
                y: i32::try_from(y).unwrap_or(i32::MAX),
                color: color.as_str().to_owned(),
            });
        }
    }

    LevelData {
        cells,
        columns: deal(&totals),
    }
}

fn deal(totals: &BTreeMap<BlockColor, u32>) -> Vec<ShooterColumn> {
    let mut remaining: Vec<(BlockColor, u32)> = BlockColor::ALL
        .into_iter()
        .filter_map(|color| totals.get(&color).map(|total| (color, *total)))
        .collect();
    let mut columns = vec![ShooterColumn::default(); SHOWCASE_COLUMNS];
    let mut dealt = 0_usize;

    while remaining.iter().any(|(_, left)| *left > 0) {
        for (color, left) in remaining.iter_mut() {
            if *left == 0 {
                continue;
            }
            let ammo = (*left).min(SHOWCASE_MAX_AMMO);
            *left -= ammo;
            columns[dealt % SHOWCASE_COLUMNS]
                .shooters
                .push(ShooterRecord {
                    color: color.as_str().to_owned(),
                    ammo,
                });
            dealt += 1;
        }
    }

    columns
}
