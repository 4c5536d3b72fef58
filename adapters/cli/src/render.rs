use std::fmt::Write as _;

use belt_blast_core::{BlockColor, BlockState, CellCoord, ShooterState};
use belt_blast_world::{query, World};

/// Draws the grid as text, top row first.
///
/// Live blocks print as their color initial, lowercase while claimed. Empty
/// cells and destroyed blocks print as `.`.
pub(crate) fn grid(world: &World) -> String {
    let blocks = query::blocks(world);
    let size = blocks.size();
    let mut out = String::new();
    for row in (0..size).rev() {
        for column in 0..size {
            let cell = blocks.block(CellCoord::new(column, row));
            out.push(cell.map_or('.', glyph));
        }
        out.push('\n');
    }
    out
}

fn glyph(block: BlockState) -> char {
    if !block.alive {
        return '.';
    }
    let initial = match block.color {
        BlockColor::Red => 'R',
        BlockColor::Blue => 'B',
        BlockColor::Green => 'G',
        BlockColor::Yellow => 'Y',
    };
    if block.is_claimed() {
        initial.to_ascii_lowercase()
    } else {
        initial
    }
}

/// One-line summary of blocks, queue and belt occupancy.
pub(crate) fn status(world: &World) -> String {
    let shooters = query::shooters(world);
    let on_belt = shooters
        .iter()
        .filter(|snapshot| snapshot.state == ShooterState::OnBelt)
        .count();
    let queued = query::ready_slots(world).iter().flatten().count();
    let waiting: usize = query::table_columns(world).iter().map(Vec::len).sum();

    let mut line = format!(
        "blocks {} | queue {}/{} | belt {} | table {}",
        query::live_blocks(world),
        queued,
        query::ready_slots(world).len(),
        on_belt,
        waiting,
    );
    if let Some(outcome) = query::outcome(world) {
        let _ = write!(line, " | {outcome:?}");
    }
    line
}
