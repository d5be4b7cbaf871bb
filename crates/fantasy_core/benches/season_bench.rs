use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fantasy_core::models::{LineupRules, LineupSlot, Payouts};
use fantasy_core::{League, LeagueBuilder, LeagueSettings, SimulationConfig, Simulator, Unit};

/// Twelve entries, nine roster units each, round-robin regular season.
fn build_league() -> League {
    let settings = LeagueSettings {
        season: "bench".into(),
        current_week: 1,
        playoff_start_week: 12,
        num_playoff_teams: 6,
        last_place_bracket: 2,
        payouts: Payouts::new(500.0, 200.0, 100.0),
        lineup: LineupRules::new(vec![
            LineupSlot::new("QB", &["QB"], 1),
            LineupSlot::new("RB", &["RB"], 2),
            LineupSlot::new("WR", &["WR"], 2),
            LineupSlot::new("FLEX", &["RB", "WR"], 1),
        ]),
        ..Default::default()
    };

    let teams = 12;
    let mut builder = LeagueBuilder::new(settings);
    for t in 0..teams {
        let edge = t as f64 * 0.4;
        let mut roster = vec![Unit::new(&format!("qb{t}"), "QB").with_projection(18.0 + edge, 6.0)];
        for k in 0..4 {
            roster.push(Unit::new(&format!("rb{t}_{k}"), "RB").with_projection(12.0 - k as f64 + edge, 5.0));
            roster.push(Unit::new(&format!("wr{t}_{k}"), "WR").with_projection(11.0 - k as f64 + edge, 5.0));
        }
        builder = builder.entry(&format!("T{t}"), roster);
    }

    // circle method round robin
    for week in 1..12u32 {
        for i in 0..teams / 2 {
            let home = if i == 0 { 0 } else { (i + week as usize - 1) % (teams - 1) + 1 };
            let away = (teams - 1 - i + week as usize - 1) % (teams - 1) + 1;
            builder = builder.scheduled(week, &format!("T{home}"), &format!("T{away}"));
        }
    }
    builder.build().expect("bench league")
}

fn bench_season(c: &mut Criterion) {
    let league = build_league();
    let mut group = c.benchmark_group("season");
    group.sample_size(10);
    for trials in [1_000usize, 10_000] {
        let simulator = Simulator::new(SimulationConfig::default().with_trials(trials).with_seed(7));
        group.bench_with_input(BenchmarkId::from_parameter(trials), &trials, |b, _| {
            b.iter(|| black_box(simulator.evaluate(black_box(&league)).unwrap()))
        });
    }
    group.finish();
}

fn bench_unit_values(c: &mut Criterion) {
    let league = build_league();
    let simulator = Simulator::new(SimulationConfig::quick().with_seed(7));
    c.bench_function("unit_values_quick", |b| {
        b.iter(|| black_box(simulator.unit_values(black_box(&league)).unwrap()))
    });
}

criterion_group!(benches, bench_season, bench_unit_values);
criterion_main!(benches);
