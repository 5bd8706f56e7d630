// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host sampling: CPU, memory, load averages, disk usage.
//!
//! Shared by the system watchers and the agent's metrics reporting. All
//! readers are Linux `/proc` based except disk usage, which uses statvfs.

use std::io;
use std::path::Path;

/// Aggregate CPU tick counters from the first line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CpuCounters {
    pub idle: u64,
    pub total: u64,
}

/// Read the current aggregate CPU counters.
pub fn cpu_counters() -> io::Result<CpuCounters> {
    let stat = std::fs::read_to_string("/proc/stat")?;
    parse_cpu_counters(&stat)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed /proc/stat"))
}

/// CPU usage percent over the interval between two counter readings.
///
/// Returns `None` when the interval is empty (no ticks elapsed).
pub fn cpu_percent_between(earlier: CpuCounters, later: CpuCounters) -> Option<f64> {
    let total = later.total.checked_sub(earlier.total)?;
    if total == 0 {
        return None;
    }
    let idle = later.idle.saturating_sub(earlier.idle);
    Some((1.0 - idle as f64 / total as f64) * 100.0)
}

fn parse_cpu_counters(stat: &str) -> Option<CpuCounters> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 5 {
        return None;
    }
    // idle + iowait count as idle time
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    let total: u64 = fields.iter().sum();
    Some(CpuCounters { idle, total })
}

/// Memory usage percent: `(total − available) / total × 100`.
pub fn memory_percent() -> io::Result<f64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo")?;
    parse_memory_percent(&meminfo)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed /proc/meminfo"))
}

fn parse_memory_percent(meminfo: &str) -> Option<f64> {
    let field = |name: &str| -> Option<f64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(name))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    };
    let total = field("MemTotal:")?;
    let available = field("MemAvailable:")?;
    if total <= 0.0 {
        return None;
    }
    Some((total - available) / total * 100.0)
}

/// The three load averages from `/proc/loadavg`.
pub fn load_averages() -> io::Result<(f64, f64, f64)> {
    let loadavg = std::fs::read_to_string("/proc/loadavg")?;
    let mut fields = loadavg.split_whitespace();
    let mut next = || -> Option<f64> { fields.next()?.parse().ok() };
    match (next(), next(), next()) {
        (Some(one), Some(five), Some(fifteen)) => Ok((one, five, fifteen)),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "malformed /proc/loadavg",
        )),
    }
}

/// Disk usage percent of the filesystem holding `path`.
pub fn disk_percent(path: &Path) -> io::Result<f64> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(io::Error::from)?;
    let total = stat.blocks() as f64;
    if total <= 0.0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "filesystem reports zero blocks",
        ));
    }
    let available = stat.blocks_available() as f64;
    Ok((total - available) / total * 100.0)
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
