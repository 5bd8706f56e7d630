// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_cpu_counters() {
    let stat = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 50 0 25 400 25 0 0 0 0 0\n";
    let counters = parse_cpu_counters(stat).unwrap();
    assert_eq!(counters.idle, 850);
    assert_eq!(counters.total, 1000);
}

#[test]
fn cpu_percent_uses_the_delta() {
    let earlier = CpuCounters {
        idle: 800,
        total: 1000,
    };
    let later = CpuCounters {
        idle: 850,
        total: 1100,
    };
    // 100 ticks elapsed, 50 idle → 50% busy
    let percent = cpu_percent_between(earlier, later).unwrap();
    assert!((percent - 50.0).abs() < 1e-9);
}

#[test]
fn cpu_percent_on_empty_interval_is_none() {
    let counters = CpuCounters {
        idle: 10,
        total: 100,
    };
    assert!(cpu_percent_between(counters, counters).is_none());
}

#[test]
fn parses_memory_percent() {
    let meminfo = "MemTotal:       1000 kB\nMemFree:         300 kB\nMemAvailable:    400 kB\n";
    let percent = parse_memory_percent(meminfo).unwrap();
    assert!((percent - 60.0).abs() < 1e-9);
}

#[test]
fn live_probes_work_on_linux() {
    // These read the real /proc; on any Linux host they must succeed
    assert!(cpu_counters().unwrap().total > 0);
    let memory = memory_percent().unwrap();
    assert!((0.0..=100.0).contains(&memory));
    let (one, _five, _fifteen) = load_averages().unwrap();
    assert!(one >= 0.0);
    let disk = disk_percent(Path::new("/")).unwrap();
    assert!((0.0..=100.0).contains(&disk));
}
