use std::collections::BTreeSet;

use belt_blast_core::{
    BlockColor, CellCoord, CellRecord, ColumnIndex, Command, Event, LevelData, ScheduleEntry,
    ShooterColumn, ShooterId, ShooterRecord, StageConfig,
};
use belt_blast_system_scheduling::ScheduleComputer;
use belt_blast_world::{self as world, query, World};

fn level(cells: Vec<CellRecord>, columns: Vec<Vec<(&str, u32)>>) -> LevelData {
    LevelData {
        cells,
        columns: columns
            .into_iter()
            .map(|shooters| ShooterColumn {
                shooters: shooters
                    .into_iter()
                    .map(|(color, ammo)| ShooterRecord {
                        color: color.to_owned(),
                        ammo,
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn filled(size: i32, color: &str) -> Vec<CellRecord> {
    (0..size)
        .flat_map(|y| {
            (0..size).map(move |x| CellRecord {
                x,
                y,
                color: color.to_owned(),
            })
        })
        .collect()
}

fn load(world: &mut World, level: LevelData) {
    let mut events = Vec::new();
    world::apply(world, Command::LoadLevel { level }, &mut events);
}

fn assert_well_formed(entries: &[ScheduleEntry], ammo: usize) {
    assert!(entries.len() <= ammo);
    let unique: BTreeSet<CellCoord> = entries.iter().map(|entry| entry.cell).collect();
    assert_eq!(unique.len(), entries.len(), "schedule repeats a cell");
    assert!(entries.windows(2).all(|pair| pair[0].step < pair[1].step));
}

#[test]
fn full_red_grid_schedules_the_bottom_row() {
    let mut world = World::new();
    load(&mut world, level(filled(20, "red"), Vec::new()));

    let blocks = query::blocks(&world);
    let entries = ScheduleComputer::new().compute(
        query::belt_layout(&world),
        &blocks,
        ShooterId::new(0),
        BlockColor::Red,
        20,
    );

    assert_eq!(entries.len(), 20);
    assert_eq!(entries[0].cell, CellCoord::new(0, 0));
    assert_eq!(entries[0].step.get(), 0);
    for (index, entry) in entries.iter().enumerate() {
        assert_eq!(entry.cell, CellCoord::new(index as u32, 0));
    }
    assert_well_formed(&entries, 20);
}

#[test]
fn mixed_grid_schedule_is_well_formed() {
    let mut world = World::new();
    let mut cells = filled(20, "blue");
    for record in cells.iter_mut() {
        if (record.x + record.y) % 3 == 0 {
            record.color = "red".to_owned();
        }
    }
    load(&mut world, level(cells, Vec::new()));

    let blocks = query::blocks(&world);
    for ammo in [0_u32, 1, 7, 80] {
        let entries = ScheduleComputer::new().compute(
            query::belt_layout(&world),
            &blocks,
            ShooterId::new(0),
            BlockColor::Red,
            ammo,
        );
        assert_well_formed(&entries, ammo as usize);
        for entry in &entries {
            assert_eq!(
                blocks.block(entry.cell).map(|block| block.color),
                Some(BlockColor::Red)
            );
        }
    }
}

#[test]
fn requests_answered_together_never_share_targets() {
    let config = StageConfig {
        grid_size: 6,
        ..StageConfig::default()
    };
    let mut world = World::with_config(config).expect("config is valid");
    load(
        &mut world,
        level(filled(6, "red"), vec![vec![("red", 30)], vec![("red", 30)]]),
    );

    let mut events = Vec::new();
    for column in 0..2 {
        world::apply(
            &mut world,
            Command::SelectShooter {
                column: ColumnIndex::new(column),
            },
            &mut events,
        );
    }
    events.clear();
    for shooter in 0..2 {
        world::apply(
            &mut world,
            Command::ActivateShooter {
                shooter: ShooterId::new(shooter),
            },
            &mut events,
        );
    }

    let mut commands = Vec::new();
    ScheduleComputer::new().handle(
        &events,
        query::belt_layout(&world),
        &query::blocks(&world),
        &query::shooters(&world),
        &mut commands,
    );
    assert_eq!(commands.len(), 2);

    let mut seen = BTreeSet::new();
    for command in &commands {
        let Command::AssignSchedule { entries, .. } = command else {
            panic!("unexpected command {command:?}");
        };
        for entry in entries {
            assert!(seen.insert(entry.cell), "cell {:?} targeted twice", entry.cell);
        }
    }
    assert!(!seen.is_empty());

    let mut applied = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut applied);
    }
    let assigned: u32 = applied
        .iter()
        .filter_map(|event| match event {
            Event::ScheduleAssigned { shots, .. } => Some(*shots),
            _ => None,
        })
        .sum();
    assert_eq!(assigned as usize, seen.len());
}

#[test]
fn claims_held_by_the_world_are_not_rescheduled() {
    let config = StageConfig {
        grid_size: 4,
        ..StageConfig::default()
    };
    let mut world = World::with_config(config).expect("config is valid");
    load(
        &mut world,
        level(filled(4, "red"), vec![vec![("red", 4), ("red", 4)]]),
    );

    let computer = ScheduleComputer::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SelectShooter {
            column: ColumnIndex::new(0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::ActivateShooter {
            shooter: ShooterId::new(0),
        },
        &mut events,
    );
    let first = computer.compute(
        query::belt_layout(&world),
        &query::blocks(&world),
        ShooterId::new(0),
        BlockColor::Red,
        4,
    );
    world::apply(
        &mut world,
        Command::AssignSchedule {
            shooter: ShooterId::new(0),
            entries: first.clone(),
        },
        &mut events,
    );

    let second = computer.compute(
        query::belt_layout(&world),
        &query::blocks(&world),
        ShooterId::new(1),
        BlockColor::Red,
        4,
    );
    let taken: BTreeSet<_> = first.iter().map(|entry| entry.cell).collect();
    assert!(second.iter().all(|entry| !taken.contains(&entry.cell)));
}
